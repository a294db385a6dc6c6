//! Label Compositor - Single Entry Point
//!
//! compose() expands the selection into print units, resolves every unit
//! against the current overrides, paginates and renders.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

use crate::hashing::compute_job_hash;
use crate::model::ChemicalRecord;
use crate::overrides::OverrideMap;
use crate::pictograms::PictogramCatalog;
use crate::print::{clamp_quantity, page_capacity};
use crate::render::{LabelRenderer, LinkConfig};
use crate::resolver::{resolve, EffectiveClassification};
use crate::templates::{CustomFields, LabelConfig};

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComposeRequest {
    pub selection: Vec<ChemicalRecord>,
    #[serde(default)]
    pub config: LabelConfig,
    #[serde(default)]
    pub custom_fields: CustomFields,
    /// Copies per CAS; absent means one.
    #[serde(default)]
    pub quantities: HashMap<String, i64>,
}

impl ComposeRequest {
    pub fn quantity(&self, cas: &str) -> usize {
        clamp_quantity(self.quantities.get(cas.trim()).copied())
    }
}

/// One physical label.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrintUnit {
    pub cas_number: String,
    pub name_en: Option<String>,
    pub name_zh: Option<String>,
    pub cid: Option<u64>,
    /// 1-based copy number within this chemical's run.
    pub copy: usize,
    pub classification: EffectiveClassification,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub units: Vec<PrintUnit>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PrintDocument {
    pub job_hash: String,
    pub config: LabelConfig,
    pub unit_count: usize,
    pub page_count: usize,
    pub pages: Vec<Page>,
    pub image_sources: Vec<String>,
    #[serde(skip)]
    pub html: String,
}

#[derive(Serialize)]
struct JobFingerprint<'a> {
    config: &'a LabelConfig,
    custom_fields: &'a CustomFields,
    units: &'a [PrintUnit],
}

/// The compositor - single entry point for building print documents
pub struct LabelCompositor {
    catalog: PictogramCatalog,
    links: LinkConfig,
}

impl LabelCompositor {
    pub fn new(catalog: PictogramCatalog, links: LinkConfig) -> Self {
        Self { catalog, links }
    }

    /// Expand the selection into consecutive copies, in selection order.
    /// The selection is a set: a CAS number selected twice prints once, at
    /// its first position. Records that do not resolve contribute nothing.
    pub fn expand_units(&self, request: &ComposeRequest, overrides: &OverrideMap) -> Vec<PrintUnit> {
        let mut units = vec![];
        let mut seen = HashSet::new();

        for record in &request.selection {
            let cas = record.cas_number.trim();
            if !seen.insert(cas) {
                tracing::debug!(cas = %cas, "ignoring repeated selection entry");
                continue;
            }
            let Some(classification) = resolve(Some(record), overrides.get(cas)) else {
                tracing::warn!(cas = %cas, "skipping chemical without classification data");
                continue;
            };

            let copies = request.quantity(cas);
            for copy in 1..=copies {
                units.push(PrintUnit {
                    cas_number: cas.to_string(),
                    name_en: record.name_en.clone(),
                    name_zh: record.name_zh.clone(),
                    cid: record.cid,
                    copy,
                    classification: classification.clone(),
                });
            }
        }

        units
    }

    /// Build the print document. An empty selection (or one where nothing
    /// resolves) produces no document.
    pub fn compose(
        &self,
        request: &ComposeRequest,
        overrides: &OverrideMap,
    ) -> Result<Option<PrintDocument>, PipelineError> {
        if request.selection.is_empty() {
            return Ok(None);
        }

        let units = self.expand_units(request, overrides);
        if units.is_empty() {
            return Ok(None);
        }

        let job_hash = compute_job_hash(&JobFingerprint {
            config: &request.config,
            custom_fields: &request.custom_fields,
            units: &units,
        })?;

        let capacity = page_capacity(request.config.size, request.config.orientation);
        let unit_count = units.len();
        let pages: Vec<Page> = units
            .chunks(capacity)
            .map(|chunk| Page {
                units: chunk.to_vec(),
            })
            .collect();

        let renderer = LabelRenderer::new(&self.catalog, &self.links, request.config, &request.custom_fields);
        let (html, mut image_sources) = renderer.render_document(&pages);
        image_sources.sort();
        image_sources.dedup();

        tracing::debug!(
            job_hash = %job_hash,
            units = unit_count,
            pages = pages.len(),
            images = image_sources.len(),
            "label document composed"
        );

        Ok(Some(PrintDocument {
            job_hash,
            config: request.config,
            unit_count,
            page_count: pages.len(),
            pages,
            image_sources,
            html,
        }))
    }
}

impl Default for LabelCompositor {
    fn default() -> Self {
        Self::new(PictogramCatalog::default(), LinkConfig::default())
    }
}
