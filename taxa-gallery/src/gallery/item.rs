//! One rendered gallery item and its markup

use std::fmt::Write as _;

use crate::models::ImageRecord;
use crate::services::wikidata_client::WIKI_LANGS;

/// 1×1 transparent GIF shown until the real image is swapped in
pub const PLACEHOLDER_SRC: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

/// Shown where enrichment has not (yet) produced data
pub const UNABLE_TO_FETCH: &str = "(unable to fetch)";

/// Substituted for missing external identifiers
pub const UNKNOWN_ID: &str = "Unknown";

/// Wikipedia availability of an item's taxon
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WikiLanguages {
    Unknown,
    Known(Vec<String>),
}

/// Global reuse count of an item's file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GlobalUsage {
    Unknown,
    Count(usize),
}

/// A link to one language edition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLink {
    pub lang: &'static str,
    pub url: String,
    pub available: bool,
}

impl WikiLink {
    pub fn css_class(&self) -> &'static str {
        if self.available {
            "wiki-link-blue"
        } else {
            "wiki-link-red"
        }
    }
}

/// External link shown in the legend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalLink {
    pub label: &'static str,
    pub url: String,
}

/// View model of one gallery entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GalleryItem {
    /// Element id, unique within a gallery generation
    pub id: String,
    pub qid: Option<String>,
    pub taxon_name: String,
    /// Commons page title of the file, without the `File:` prefix
    pub file_name: Option<String>,
    /// Real image URL; deferred until the image scrolls into view
    pub image_url: String,
    pub links: Vec<ExternalLink>,
    pub wiki_languages: WikiLanguages,
    pub global_usage: GlobalUsage,
}

impl GalleryItem {
    pub fn from_record(id: String, record: &ImageRecord) -> Self {
        let id_or_unknown = |v: &Option<String>| -> String {
            let raw = v.as_deref().unwrap_or(UNKNOWN_ID);
            urlencoding::encode(raw).into_owned()
        };

        let links = vec![
            ExternalLink {
                label: "iNat",
                url: format!("https://www.inaturalist.org/taxa/{}", id_or_unknown(&record.inat_id)),
            },
            ExternalLink {
                label: "GBIF",
                url: format!("https://www.gbif.org/species/{}", id_or_unknown(&record.gbif_id)),
            },
            ExternalLink {
                label: "BHL",
                url: format!(
                    "https://www.biodiversitylibrary.org/page/{}",
                    id_or_unknown(&record.bhl_page_id)
                ),
            },
            ExternalLink {
                label: "Commons",
                url: record.file.clone().unwrap_or_default(),
            },
            ExternalLink {
                label: "Wikidata",
                url: record.taxon.clone().unwrap_or_default(),
            },
        ];

        Self {
            id,
            qid: record.qid().map(str::to_string),
            taxon_name: record.display_name().to_string(),
            file_name: record.file_name(),
            image_url: record.url.clone().unwrap_or_default(),
            links,
            wiki_languages: match &record.langs {
                Some(langs) => WikiLanguages::Known(langs.clone()),
                None => WikiLanguages::Unknown,
            },
            global_usage: GlobalUsage::Unknown,
        }
    }

    /// Links for the tracked languages, or `None` while availability is unknown
    pub fn wiki_links(&self) -> Option<Vec<WikiLink>> {
        let WikiLanguages::Known(available) = &self.wiki_languages else {
            return None;
        };
        let title = urlencoding::encode(&self.taxon_name);
        Some(
            WIKI_LANGS
                .iter()
                .map(|&lang| WikiLink {
                    lang,
                    url: format!("https://{}.wikipedia.org/wiki/{}", lang, title),
                    available: available.iter().any(|a| a == lang),
                })
                .collect(),
        )
    }

    pub fn global_usage_text(&self) -> String {
        match self.global_usage {
            GlobalUsage::Unknown => format!("Global Usage: {}", UNABLE_TO_FETCH),
            GlobalUsage::Count(n) => format!("Global Usage: {}", n),
        }
    }

    /// Markup of the Wikipedia links paragraph
    pub fn wiki_links_html(&self) -> String {
        let mut html = String::from(r#"<p class="wikipedia-links">Wikipedia links: "#);
        match self.wiki_links() {
            None => html.push_str(UNABLE_TO_FETCH),
            Some(links) => {
                let rendered: Vec<String> = links
                    .iter()
                    .map(|l| {
                        format!(
                            r#"<a href="{}" target="_blank" class="{}">{}</a>"#,
                            escape_html(&l.url),
                            l.css_class(),
                            l.lang.to_uppercase()
                        )
                    })
                    .collect();
                html.push_str(&rendered.join(" | "));
            }
        }
        html.push_str("</p>");
        html
    }

    /// Full item markup; `src` is either the placeholder or the real URL
    pub fn to_html(&self, src: &str) -> String {
        let mut html = String::new();
        let _ = write!(
            html,
            r#"<div class="gallery-item" id="{}" data-qid="{}" data-taxon="{}">"#,
            escape_html(&self.id),
            escape_html(self.qid.as_deref().unwrap_or("")),
            escape_html(&self.taxon_name)
        );
        let _ = write!(
            html,
            r#"<img src="{}" data-src="{}" data-file="{}" alt="{}">"#,
            escape_html(src),
            escape_html(&self.image_url),
            escape_html(self.file_name.as_deref().unwrap_or("")),
            escape_html(&self.taxon_name)
        );
        html.push_str(r#"<div class="image-legend">"#);
        let _ = write!(html, "<p>{}</p>", escape_html(&self.taxon_name));

        let links: Vec<String> = self
            .links
            .iter()
            .map(|l| {
                format!(
                    r#"<a href="{}" target="_blank">{}</a>"#,
                    escape_html(&l.url),
                    l.label
                )
            })
            .collect();
        let _ = write!(html, "<p>{}</p>", links.join(" | "));

        html.push_str(&self.wiki_links_html());
        let _ = write!(
            html,
            r#"<p class="global-usage">{}</p>"#,
            escape_html(&self.global_usage_text())
        );
        html.push_str("</div></div>");
        html
    }
}

pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
