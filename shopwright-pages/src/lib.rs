//! Shopwright Pages - Dynamic Page Composition
//!
//! Pages are ordered trees of sections. Each section names a registered
//! component; components carry variants, renderers and resolvers that pull
//! live data (products, carts) before render.
//!
//! The registry is built once at startup, frozen behind an `Arc`, and shared
//! with the resolver, the page service and the HTTP layer.

pub mod component;
pub mod components;
pub mod error;
pub mod registry;
pub mod render;
pub mod resolver;
pub mod schema;
pub mod seed;
pub mod service;
pub mod validator;

pub use component::{
    ComponentDescriptor, ComponentSchema, RenderFn, RenderedComponent, SectionResolver,
    VariantDescriptor, VariantSchema,
};
pub use components::{default_registry, register_builtins};
pub use error::{PageError, PageResult, PageValidationError, RegistryError, ResolveError, SectionPath};
pub use registry::ComponentRegistry;
pub use render::{render_sections, RenderedSection};
pub use resolver::{PageResolver, ResolveReport, SectionFailure};
pub use schema::{PropDefinition, PropSchema, PropType};
pub use seed::{default_home_page, HOME_ROUTE};
pub use service::{PageService, RenderedPage};
pub use validator::{validate_page, validate_section_props};
