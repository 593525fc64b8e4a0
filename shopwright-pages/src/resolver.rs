//! Page Resolver
//!
//! Walks a page's sections in declared order and runs each one's resolver
//! through the registry. A failing section is logged and reported, never
//! fatal: the rest of the page still resolves.

use crate::error::{ResolveError, SectionPath};
use crate::registry::ComponentRegistry;
use serde::{Serialize, Serializer};
use serde_json::Value as JsonValue;
use shopwright_core::{PageConfig, RequestScope, Section, CHILDREN_PROP};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tracing::{debug, warn};

/// One section whose resolver returned an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionFailure {
    pub path: SectionPath,
    pub component_type: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: ResolveError,
}

impl SectionFailure {
    /// Top-level section index.
    pub fn index(&self) -> usize {
        self.path.indices().first().copied().unwrap_or_default()
    }
}

/// Outcome of resolving one page.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ResolveReport {
    /// Sections a resolver was dispatched for.
    pub attempted: usize,
    /// Sections whose resolver succeeded.
    pub resolved: Vec<SectionPath>,
    pub failures: Vec<SectionFailure>,
}

impl ResolveReport {
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn failure_at(&self, path: &SectionPath) -> Option<&SectionFailure> {
        self.failures.iter().find(|f| &f.path == path)
    }
}

fn serialize_display<S: Serializer>(error: &ResolveError, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(error)
}

const PROPS_KEY: &str = "props";

type ResolveFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// Resolves live data for every section of a page.
#[derive(Debug, Clone)]
pub struct PageResolver {
    registry: Arc<ComponentRegistry>,
}

impl PageResolver {
    pub fn new(registry: Arc<ComponentRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<ComponentRegistry> {
        &self.registry
    }

    /// Resolve every section of `page` in place.
    ///
    /// Only section props change; route, title and section order are left
    /// as loaded.
    pub async fn resolve(&self, scope: &RequestScope, page: &mut PageConfig) -> ResolveReport {
        let report = self.resolve_sections(scope, &mut page.sections).await;
        if !report.is_clean() {
            warn!(
                tenant_id = %scope.tenant_id(),
                route = %page.route,
                failed = report.failed(),
                attempted = report.attempted,
                "Page resolved with failed sections"
            );
        }
        report
    }

    pub async fn resolve_sections(&self, scope: &RequestScope, sections: &mut [Section]) -> ResolveReport {
        let mut report = ResolveReport::default();
        for (index, section) in sections.iter_mut().enumerate() {
            self.resolve_tree(scope, section, SectionPath::root(index), &mut report)
                .await;
        }
        report
    }

    /// Resolve a section, then its children in order. The parent's resolver
    /// runs before any child's.
    fn resolve_tree<'a>(
        &'a self,
        scope: &'a RequestScope,
        section: &'a mut Section,
        path: SectionPath,
        report: &'a mut ResolveReport,
    ) -> ResolveFuture<'a> {
        Box::pin(async move {
            self.resolve_one(scope, section, &path, report).await;

            let children = match section.children() {
                None => return,
                Some(Ok(children)) if children.is_empty() => return,
                Some(Ok(children)) => children,
                Some(Err(e)) => {
                    debug!(section = %path, error = %e, "Skipping malformed children");
                    return;
                }
            };
            let Some(JsonValue::Array(stored)) = section.props.get_mut(CHILDREN_PROP) else {
                return;
            };
            // Stored child objects are only touched when something under them
            // resolved, so keys outside {type, props} survive.
            for (index, (mut child, raw)) in children.into_iter().zip(stored.iter_mut()).enumerate() {
                let attempted = report.attempted;
                self.resolve_tree(scope, &mut child, path.child(index), report).await;
                if report.attempted == attempted {
                    continue;
                }
                if let JsonValue::Object(object) = raw {
                    object.insert(PROPS_KEY.to_string(), JsonValue::Object(child.props));
                }
            }
        })
    }

    async fn resolve_one(
        &self,
        scope: &RequestScope,
        section: &mut Section,
        path: &SectionPath,
        report: &mut ResolveReport,
    ) {
        let Some(component) = self.registry.get(&section.component_type) else {
            warn!(
                section = %path,
                component_type = %section.component_type,
                "Unknown component type, keeping static props"
            );
            return;
        };
        let Some(resolver) = component.resolver_for(section).cloned() else {
            return;
        };

        report.attempted += 1;
        match resolver.resolve(scope, section).await {
            Ok(()) => report.resolved.push(path.clone()),
            Err(error) => {
                warn!(
                    tenant_id = %scope.tenant_id(),
                    section = %path,
                    component_type = %section.component_type,
                    error = %error,
                    "Section resolver failed"
                );
                report.failures.push(SectionFailure {
                    path: path.clone(),
                    component_type: section.component_type.clone(),
                    error,
                });
            }
        }
    }
}
