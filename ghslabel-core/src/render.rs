//! Label Rendering - HTML/CSS for a print document

use serde::{Deserialize, Serialize};

use crate::model::SignalWord;
use crate::pictograms::{normalize_code, pictogram_names, PictogramCatalog};
use crate::pipeline::{Page, PrintUnit};
use crate::print::{
    base_font_px, full_hazard_font_px, grid_columns, label_dimensions_mm, page_size_css,
    pictogram_mm, standard_hazard_cap, LABEL_GAP_MM, PAGE_MARGIN_MM,
};
use crate::templates::{CustomFields, LabelConfig, LabelTemplate, NameDisplay};

/// Where QR codes point and who draws them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkConfig {
    pub lookup_base_url: String,
    pub qr_endpoint: String,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            lookup_base_url: "https://pubchem.ncbi.nlm.nih.gov".to_string(),
            qr_endpoint: "https://api.qrserver.com/v1/create-qr-code/".to_string(),
        }
    }
}

impl LinkConfig {
    /// External-id page when a cid is known, else a query keyed by CAS.
    pub fn lookup_url(&self, cas: &str, cid: Option<u64>) -> String {
        let base = self.lookup_base_url.trim_end_matches('/');
        match cid {
            Some(cid) => format!("{base}/compound/{cid}"),
            None => format!("{base}/#query={}", urlencoding::encode(cas)),
        }
    }

    pub fn qr_image_url(&self, data: &str) -> String {
        let sep = if self.qr_endpoint.contains('?') { '&' } else { '?' };
        format!(
            "{}{sep}size=150x150&data={}",
            self.qr_endpoint,
            urlencoding::encode(data)
        )
    }
}

pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// (primary, secondary) name lines for a label.
pub fn display_names(unit: &PrintUnit, mode: NameDisplay) -> (String, Option<String>) {
    let en = unit.name_en.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let zh = unit.name_zh.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let fallback = || unit.cas_number.clone();

    match mode {
        NameDisplay::En => (en.or(zh).map(str::to_string).unwrap_or_else(fallback), None),
        NameDisplay::Zh => (zh.or(en).map(str::to_string).unwrap_or_else(fallback), None),
        NameDisplay::Both => match (zh, en) {
            (Some(zh), Some(en)) => (zh.to_string(), Some(en.to_string())),
            (Some(only), None) | (None, Some(only)) => (only.to_string(), None),
            (None, None) => (fallback(), None),
        },
    }
}

fn signal_text(word: SignalWord, mode: NameDisplay) -> String {
    match mode {
        NameDisplay::En => word.as_str().to_string(),
        NameDisplay::Zh => word.as_zh().to_string(),
        NameDisplay::Both => format!("{} {}", word.as_zh(), word.as_str()),
    }
}

/// Builds the markup for one document. Collects every embedded image
/// source so the spooler knows what to wait for.
pub struct LabelRenderer<'a> {
    catalog: &'a PictogramCatalog,
    links: &'a LinkConfig,
    config: LabelConfig,
    fields: &'a CustomFields,
    images: Vec<String>,
}

impl<'a> LabelRenderer<'a> {
    pub fn new(
        catalog: &'a PictogramCatalog,
        links: &'a LinkConfig,
        config: LabelConfig,
        fields: &'a CustomFields,
    ) -> Self {
        Self {
            catalog,
            links,
            config,
            fields,
            images: Vec::new(),
        }
    }

    /// Full HTML document plus the image sources it embeds.
    pub fn render_document(mut self, pages: &[Page]) -> (String, Vec<String>) {
        let mut html = String::new();
        html.push_str("<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n");
        html.push_str("<title>GHS Labels</title>\n<style>\n");
        html.push_str(&self.stylesheet());
        html.push_str("</style>\n</head>\n<body>\n");

        for (i, page) in pages.iter().enumerate() {
            let class = if i + 1 < pages.len() { "page page-break" } else { "page" };
            html.push_str(&format!("<div class=\"{class}\" data-page=\"{}\">\n", i + 1));
            for unit in &page.units {
                html.push_str(&self.render_label(unit));
            }
            html.push_str("</div>\n");
        }

        html.push_str("</body>\n</html>\n");
        (html, self.images)
    }

    fn stylesheet(&self) -> String {
        let size = self.config.size;
        let (w, h) = label_dimensions_mm(size);
        let columns = grid_columns(size, self.config.orientation);
        let picto = pictogram_mm(size);
        format!(
            "@page {{ size: {page}; margin: {margin}mm; }}\n\
             * {{ box-sizing: border-box; }}\n\
             body {{ margin: 0; font-family: \"Helvetica Neue\", Arial, \"Microsoft YaHei\", sans-serif; }}\n\
             .page {{ display: grid; grid-template-columns: repeat({columns}, {w}mm); grid-auto-rows: {h}mm; gap: {gap}mm; }}\n\
             .page-break {{ page-break-after: always; break-after: page; }}\n\
             .label {{ width: {w}mm; height: {h}mm; border: 1.5px solid #000; border-radius: 2mm; padding: 2mm; overflow: hidden; font-size: {font}px; display: flex; flex-direction: column; gap: 1mm; }}\n\
             .name {{ font-weight: bold; font-size: 1.2em; line-height: 1.15; }}\n\
             .name-secondary {{ font-size: 0.9em; color: #333; }}\n\
             .cas {{ font-family: monospace; }}\n\
             .custom-fields {{ display: flex; flex-wrap: wrap; gap: 0 2mm; font-size: 0.85em; }}\n\
             .pictograms {{ display: flex; flex-wrap: wrap; gap: 1mm; }}\n\
             .pictogram, .pictogram-fallback {{ width: {picto}mm; height: {picto}mm; }}\n\
             .pictogram-fallback {{ display: inline-flex; align-items: center; justify-content: center; border: 1px dashed #c00; font-size: 0.8em; }}\n\
             .signal {{ display: inline-block; padding: 0.3mm 1.5mm; font-weight: bold; color: #fff; border-radius: 1mm; align-self: flex-start; }}\n\
             .signal-danger {{ background: #c62828; }}\n\
             .signal-warning {{ background: #ef8f00; }}\n\
             .hazards {{ margin: 0; padding-left: 3mm; line-height: 1.2; }}\n\
             .hazards-more {{ font-style: italic; color: #555; }}\n\
             .qr {{ width: {qr}mm; height: {qr}mm; }}\n",
            page = page_size_css(self.config.orientation),
            margin = PAGE_MARGIN_MM,
            gap = LABEL_GAP_MM,
            font = base_font_px(size),
            qr = picto * 1.5,
        )
    }

    fn render_label(&mut self, unit: &PrintUnit) -> String {
        let template = self.config.template;
        let mut html = format!(
            "<div class=\"label label-{}\" data-cas=\"{}\">\n",
            template_class(template),
            escape_html(&unit.cas_number)
        );

        html.push_str(&self.render_header(unit));
        html.push_str(&self.render_custom_fields());
        html.push_str(&self.render_pictograms(&unit.classification.pictograms));
        html.push_str(&self.render_signal(unit.classification.signal_word));

        match template {
            LabelTemplate::Icon => {}
            LabelTemplate::Standard => {
                html.push_str(&self.render_hazards(unit, Some(standard_hazard_cap(self.config.size)), None));
            }
            LabelTemplate::Full => {
                let font = full_hazard_font_px(unit.classification.hazard_statements.len(), self.config.size);
                html.push_str(&self.render_hazards(unit, None, Some(font)));
            }
            LabelTemplate::QrCode => {
                html.push_str(&self.render_qr(unit));
            }
        }

        html.push_str("</div>\n");
        html
    }

    fn render_header(&self, unit: &PrintUnit) -> String {
        let (primary, secondary) = display_names(unit, self.config.name_display);
        let mut html = format!("<div class=\"name\">{}</div>\n", escape_html(&primary));
        if let Some(secondary) = secondary {
            html.push_str(&format!(
                "<div class=\"name-secondary\">{}</div>\n",
                escape_html(&secondary)
            ));
        }
        html.push_str(&format!(
            "<div class=\"cas\">CAS: {}</div>\n",
            escape_html(&unit.cas_number)
        ));
        html
    }

    fn render_custom_fields(&self) -> String {
        let entries = self.fields.entries();
        if entries.is_empty() {
            return String::new();
        }
        let mut html = String::from("<div class=\"custom-fields\">");
        for (label, value) in entries {
            html.push_str(&format!(
                "<span>{}: {}</span>",
                label,
                escape_html(value)
            ));
        }
        html.push_str("</div>\n");
        html
    }

    fn render_pictograms(&mut self, codes: &[String]) -> String {
        if codes.is_empty() {
            return String::new();
        }
        let mut html = String::from("<div class=\"pictograms\">");
        for code in codes {
            let code = normalize_code(code);
            let escaped = escape_html(&code);
            match self.catalog.image_src(&code) {
                Some(src) => {
                    let title = pictogram_names(&code)
                        .map(|(en, zh)| format!("{en} / {zh}"))
                        .unwrap_or_default();
                    html.push_str(&format!(
                        "<img class=\"pictogram\" src=\"{src}\" alt=\"{escaped}\" title=\"{title}\" \
                         onerror=\"this.outerHTML='&lt;span class=&quot;pictogram-fallback&quot;&gt;{escaped}&lt;/span&gt;'\">",
                        src = escape_html(&src),
                        title = escape_html(&title),
                    ));
                    self.images.push(src);
                }
                None => {
                    html.push_str(&format!("<span class=\"pictogram-fallback\">{escaped}</span>"));
                }
            }
        }
        html.push_str("</div>\n");
        html
    }

    fn render_signal(&self, signal: Option<SignalWord>) -> String {
        match signal {
            Some(word) => format!(
                "<span class=\"signal signal-{}\">{}</span>\n",
                word.as_str().to_ascii_lowercase(),
                escape_html(&signal_text(word, self.config.name_display))
            ),
            None => String::new(),
        }
    }

    fn render_hazards(&self, unit: &PrintUnit, cap: Option<usize>, font_px: Option<f64>) -> String {
        let hazards = &unit.classification.hazard_statements;
        if hazards.is_empty() {
            return String::new();
        }
        let shown = cap.map_or(hazards.len(), |cap| cap.min(hazards.len()));

        let mut html = match font_px {
            Some(px) => format!("<ul class=\"hazards\" style=\"font-size: {px}px\">"),
            None => String::from("<ul class=\"hazards\">"),
        };
        for hazard in &hazards[..shown] {
            html.push_str(&format!(
                "<li><b>{}</b> {}</li>",
                escape_html(&hazard.code),
                escape_html(&hazard.text)
            ));
        }
        let hidden = hazards.len() - shown;
        if hidden > 0 {
            html.push_str(&format!("<li class=\"hazards-more\">+{hidden} more</li>"));
        }
        html.push_str("</ul>\n");
        html
    }

    fn render_qr(&mut self, unit: &PrintUnit) -> String {
        let target = self.links.lookup_url(&unit.cas_number, unit.cid);
        let src = self.links.qr_image_url(&target);
        let html = format!(
            "<img class=\"qr\" src=\"{}\" alt=\"QR {}\">\n",
            escape_html(&src),
            escape_html(&unit.cas_number)
        );
        self.images.push(src);
        html
    }
}

fn template_class(template: LabelTemplate) -> &'static str {
    match template {
        LabelTemplate::Icon => "icon",
        LabelTemplate::Standard => "standard",
        LabelTemplate::Full => "full",
        LabelTemplate::QrCode => "qrcode",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::HazardStatement;
    use crate::resolver::EffectiveClassification;
    use crate::templates::{LabelSize, Orientation};

    fn unit(hazards: usize) -> PrintUnit {
        PrintUnit {
            cas_number: "7664-93-9".into(),
            name_en: Some("Sulfuric acid".into()),
            name_zh: Some("硫酸".into()),
            cid: Some(1118),
            copy: 1,
            classification: EffectiveClassification {
                pictograms: vec!["GHS05".into(), "GHS99".into()],
                hazard_statements: (0..hazards)
                    .map(|i| HazardStatement {
                        code: format!("H3{i:02}"),
                        text: format!("hazard <{i}>"),
                    })
                    .collect(),
                signal_word: Some(SignalWord::Danger),
                signal_word_zh: Some("危险".into()),
                is_custom: false,
                custom_index: 0,
                note: None,
                source: None,
            },
        }
    }

    fn render(template: LabelTemplate, unit: &PrintUnit) -> (String, Vec<String>) {
        let config = LabelConfig {
            template,
            ..Default::default()
        };
        render_with(config, unit)
    }

    fn render_with(config: LabelConfig, unit: &PrintUnit) -> (String, Vec<String>) {
        let catalog = PictogramCatalog::remote("/ghs");
        let links = LinkConfig::default();
        let fields = CustomFields::default();
        let page = Page {
            units: vec![unit.clone()],
        };
        LabelRenderer::new(&catalog, &links, config, &fields).render_document(&[page])
    }

    #[test]
    fn test_standard_caps_hazards() {
        let (html, _) = render(LabelTemplate::Standard, &unit(5));
        assert_eq!(html.matches("<li><b>").count(), 3);
        assert!(html.contains("+2 more"));
        assert!(html.contains("hazard &lt;0&gt;"));
    }

    #[test]
    fn test_full_shows_all_with_tier_font() {
        let (html, _) = render(LabelTemplate::Full, &unit(9));
        assert_eq!(html.matches("<li><b>").count(), 9);
        assert!(html.contains("font-size: 6px"));
        assert!(!html.contains("more</li>"));
    }

    #[test]
    fn test_full_tiers_follow_label_size() {
        let full = |size, hazards| {
            let config = LabelConfig {
                size,
                template: LabelTemplate::Full,
                ..Default::default()
            };
            render_with(config, &unit(hazards)).0
        };
        assert!(full(LabelSize::Small, 4).contains("<ul class=\"hazards\" style=\"font-size: 7px\">"));
        assert!(full(LabelSize::Small, 7).contains("<ul class=\"hazards\" style=\"font-size: 6.5px\">"));
        assert!(full(LabelSize::Large, 3).contains("<ul class=\"hazards\" style=\"font-size: 10px\">"));
        assert!(full(LabelSize::Large, 10).contains("<ul class=\"hazards\" style=\"font-size: 8px\">"));
    }

    #[test]
    fn test_landscape_page_and_danger_badge() {
        let config = LabelConfig {
            orientation: Orientation::Landscape,
            name_display: NameDisplay::En,
            ..Default::default()
        };
        let (html, _) = render_with(config, &unit(1));
        assert!(html.contains("@page { size: A4 landscape;"));
        assert!(html.contains("<span class=\"signal signal-danger\">Danger</span>"));
    }

    #[test]
    fn test_icon_has_no_hazards() {
        let (html, images) = render(LabelTemplate::Icon, &unit(4));
        assert!(!html.contains("class=\"hazards\""));
        assert_eq!(images, vec!["/ghs/GHS05.svg".to_string()]);
    }

    #[test]
    fn test_unknown_pictogram_is_placeholder() {
        let (html, _) = render(LabelTemplate::Icon, &unit(0));
        assert!(html.contains("<span class=\"pictogram-fallback\">GHS99</span>"));
    }

    #[test]
    fn test_qr_uses_cid_link() {
        let (html, images) = render(LabelTemplate::QrCode, &unit(2));
        let qr = images.last().unwrap();
        assert!(qr.contains(&*urlencoding::encode("https://pubchem.ncbi.nlm.nih.gov/compound/1118")));
        assert!(html.contains("class=\"qr\""));
    }

    #[test]
    fn test_lookup_url_falls_back_to_cas_query() {
        let links = LinkConfig::default();
        assert_eq!(
            links.lookup_url("64-17-5", None),
            "https://pubchem.ncbi.nlm.nih.gov/#query=64-17-5"
        );
    }

    #[test]
    fn test_names_fallback_to_english() {
        let mut u = unit(0);
        u.name_zh = Some(String::new());
        assert_eq!(display_names(&u, NameDisplay::Zh).0, "Sulfuric acid");
        assert_eq!(display_names(&u, NameDisplay::Both), ("Sulfuric acid".to_string(), None));

        let u = unit(0);
        assert_eq!(
            display_names(&u, NameDisplay::Both),
            ("硫酸".to_string(), Some("Sulfuric acid".to_string()))
        );

        let mut u = unit(0);
        u.name_en = Some("  ".into());
        assert_eq!(display_names(&u, NameDisplay::En), ("硫酸".to_string(), None));
        u.name_zh = None;
        assert_eq!(display_names(&u, NameDisplay::En), ("7664-93-9".to_string(), None));
    }
}
