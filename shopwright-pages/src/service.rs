//! Page Service
//!
//! Fetch, resolve, render, validate and save pages for the current tenant.
//! All storage goes through the request's transaction via [`PageStore`].

use crate::error::{PageError, PageResult, PageValidationError};
use crate::registry::ComponentRegistry;
use crate::render::{render_sections, RenderedSection};
use crate::resolver::{PageResolver, ResolveReport};
use crate::seed::default_home_page;
use crate::validator::{validate_page, validate_section_props};
use serde::Serialize;
use shopwright_core::{PageConfig, PageDraft, PageStore, RequestScope, Section};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

/// A resolved and rendered page.
#[derive(Debug, Clone, Serialize)]
pub struct RenderedPage {
    pub id: Uuid,
    pub route: String,
    pub title: String,
    pub sections: Vec<RenderedSection>,
    pub report: ResolveReport,
}

#[derive(Clone)]
pub struct PageService {
    registry: Arc<ComponentRegistry>,
    resolver: PageResolver,
    store: Arc<dyn PageStore>,
}

impl PageService {
    pub fn new(registry: Arc<ComponentRegistry>, store: Arc<dyn PageStore>) -> Self {
        Self {
            resolver: PageResolver::new(Arc::clone(&registry)),
            registry,
            store,
        }
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// Load a page as stored, without resolving live data.
    pub async fn get_page(&self, scope: &RequestScope, route: &str) -> PageResult<PageConfig> {
        self.store
            .find_by_route(scope, route)
            .await?
            .ok_or_else(|| PageError::NotFound {
                route: route.to_string(),
            })
    }

    /// Load a page and resolve its sections in memory.
    pub async fn resolve_page(
        &self,
        scope: &RequestScope,
        route: &str,
    ) -> PageResult<(PageConfig, ResolveReport)> {
        let mut page = self.get_page(scope, route).await?;
        let report = self.resolver.resolve(scope, &mut page).await;
        Ok((page, report))
    }

    /// Load, resolve and render a page.
    pub async fn render_page(&self, scope: &RequestScope, route: &str) -> PageResult<RenderedPage> {
        let (page, report) = self.resolve_page(scope, route).await?;
        let sections = render_sections(&self.registry, &page.sections);
        Ok(RenderedPage {
            id: page.id,
            route: page.route,
            title: page.title,
            sections,
            report,
        })
    }

    /// Structural and prop validation of a section tree.
    pub fn validate(&self, sections: &[Section]) -> Result<(), PageValidationError> {
        validate_page(&self.registry, sections)?;
        validate_section_props(&self.registry, sections)
    }

    /// Validate, then insert or replace the page at `draft.route`.
    pub async fn save_page(&self, scope: &RequestScope, draft: PageDraft) -> PageResult<PageConfig> {
        self.validate(&draft.sections)?;
        let page = self.store.upsert(scope, draft).await?;
        info!(
            tenant_id = %scope.tenant_id(),
            route = %page.route,
            sections = page.sections.len(),
            "Page saved"
        );
        Ok(page)
    }

    /// Create the default home page if the tenant has none.
    ///
    /// Returns the created page, or `None` when a home page already exists.
    pub async fn seed_defaults(&self, scope: &RequestScope) -> PageResult<Option<PageConfig>> {
        let draft = default_home_page();
        if self.store.find_by_route(scope, &draft.route).await?.is_some() {
            debug!(tenant_id = %scope.tenant_id(), "Home page exists, skipping seed");
            return Ok(None);
        }
        self.save_page(scope, draft).await.map(Some)
    }
}

impl std::fmt::Debug for PageService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageService")
            .field("components", &self.registry.len())
            .finish_non_exhaustive()
    }
}
