//! Default pages for a freshly provisioned shop.

use crate::components::{hero, product_grid};
use shopwright_core::{PageDraft, Section};

pub const HOME_ROUTE: &str = "/";

/// Home page: a hero banner above a featured product grid.
pub fn default_home_page() -> PageDraft {
    PageDraft {
        route: HOME_ROUTE.to_string(),
        title: "Home".to_string(),
        sections: vec![
            Section::new(hero::COMPONENT_TYPE)
                .with_prop("Title", "Welcome to Shopwright")
                .with_prop("Subtitle", "The best place to find digital and physical products.")
                .with_prop("ButtonText", "Browse Catalog")
                .with_prop("ButtonLink", "/products")
                .with_prop("Align", "center"),
            Section::new(product_grid::COMPONENT_TYPE)
                .with_prop("Title", "Featured Products")
                .with_prop("Limit", 4)
                .with_prop("Filter", "featured"),
        ],
    }
}
