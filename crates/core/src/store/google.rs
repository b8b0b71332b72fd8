//! Google Drive + Google Slides document store.
//!
//! Copies go through Drive v3 (`files.copy`); everything else is a Slides v1
//! `presentations.get` or `presentations.batchUpdate`. Calls carry an OAuth bearer token
//! obtained outside this process.

use super::{Document, DocumentStore, Slide};
use crate::config::FillerConfig;
use crate::error::{FillError, FillResult};
use crate::resolve::Replacement;
use filler_types::{DocumentId, SlideId};
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;

pub struct GoogleSlidesStore {
    client: Client,
    access_token: String,
    drive_api_base: String,
    slides_api_base: String,
    folder_id: Option<String>,
}

impl GoogleSlidesStore {
    /// Build a store from resolved configuration.
    ///
    /// # Errors
    /// Returns `InvalidInput` if no access token is configured, or `DocumentRequest` if
    /// the HTTP client cannot be constructed.
    pub fn from_config(cfg: &FillerConfig) -> FillResult<Self> {
        let access_token = cfg.google_access_token()?.to_owned();
        let client = Client::builder()
            .timeout(Duration::from_secs(cfg.http_timeout_secs()))
            .build()
            .map_err(FillError::DocumentRequest)?;

        Ok(Self {
            client,
            access_token,
            drive_api_base: cfg.drive_api_base().trim_end_matches('/').to_owned(),
            slides_api_base: cfg.slides_api_base().trim_end_matches('/').to_owned(),
            folder_id: cfg.drive_folder_id().map(str::to_owned),
        })
    }

    fn batch_update(&self, id: &DocumentId, requests: Vec<Value>) -> FillResult<BatchUpdateRes> {
        let url = format!("{}/presentations/{}:batchUpdate", self.slides_api_base, id);
        let res = self
            .client
            .post(&url)
            .bearer_auth(&self.access_token)
            .json(&json!({ "requests": requests }))
            .send()
            .map_err(FillError::DocumentRequest)?;
        check_status(res)?
            .json()
            .map_err(FillError::DocumentRequest)
    }
}

fn check_status(res: Response) -> FillResult<Response> {
    let status = res.status();
    if status.is_success() {
        return Ok(res);
    }
    let body = res.text().unwrap_or_default();
    Err(FillError::DocumentApi {
        status: status.as_u16(),
        body,
    })
}

// ============================================================================
// Wire models
// ============================================================================

#[derive(Deserialize)]
struct CopyRes {
    id: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PresentationRes {
    presentation_id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    slides: Vec<PageRes>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageRes {
    object_id: String,
    #[serde(default)]
    page_elements: Vec<PageElementRes>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageElementRes {
    #[serde(default)]
    shape: Option<ShapeRes>,
    #[serde(default)]
    table: Option<TableRes>,
    #[serde(default)]
    element_group: Option<GroupRes>,
}

#[derive(Deserialize)]
struct ShapeRes {
    #[serde(default)]
    text: Option<TextContentRes>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableRes {
    #[serde(default)]
    table_rows: Vec<TableRowRes>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TableRowRes {
    #[serde(default)]
    table_cells: Vec<ShapeRes>,
}

#[derive(Deserialize)]
struct GroupRes {
    #[serde(default)]
    children: Vec<PageElementRes>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextContentRes {
    #[serde(default)]
    text_elements: Vec<TextElementRes>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TextElementRes {
    #[serde(default)]
    text_run: Option<TextRunRes>,
}

#[derive(Deserialize)]
struct TextRunRes {
    #[serde(default)]
    content: String,
}

#[derive(Deserialize)]
struct BatchUpdateRes {
    #[serde(default)]
    replies: Vec<Value>,
}

fn collect_text(element: &PageElementRes, out: &mut String) {
    let mut push = |text: &Option<TextContentRes>| {
        for run in text
            .iter()
            .flat_map(|t| &t.text_elements)
            .filter_map(|e| e.text_run.as_ref())
        {
            out.push_str(&run.content);
        }
    };

    if let Some(shape) = &element.shape {
        push(&shape.text);
    }
    if let Some(table) = &element.table {
        for cell in table.table_rows.iter().flat_map(|r| &r.table_cells) {
            push(&cell.text);
        }
    }
    if let Some(group) = &element.element_group {
        for child in &group.children {
            collect_text(child, out);
        }
    }
}

impl PresentationRes {
    fn into_document(self) -> FillResult<Document> {
        let slides = self
            .slides
            .iter()
            .map(|page| {
                let mut text = String::new();
                for element in &page.page_elements {
                    collect_text(element, &mut text);
                }
                Ok(Slide {
                    id: SlideId::new(&page.object_id)?,
                    text,
                })
            })
            .collect::<FillResult<Vec<_>>>()?;

        Ok(Document {
            id: DocumentId::new(&self.presentation_id)?,
            name: self.title,
            slides,
        })
    }
}

/// `replaceAllText` requests, optionally limited to one page.
fn replace_requests(replacements: &[Replacement], page: Option<&SlideId>) -> Vec<Value> {
    replacements
        .iter()
        .map(|r| {
            let mut request = json!({
                "replaceAllText": {
                    "containsText": { "text": r.placeholder.token(), "matchCase": true },
                    "replaceText": r.value,
                }
            });
            if let Some(page) = page {
                request["replaceAllText"]["pageObjectIds"] = json!([page.as_str()]);
            }
            request
        })
        .collect()
}

impl DocumentStore for GoogleSlidesStore {
    fn copy_document(&self, template: &DocumentId, name: &str) -> FillResult<DocumentId> {
        let url = format!("{}/files/{}/copy", self.drive_api_base, template);
        let mut body = json!({ "name": name });
        if let Some(folder) = &self.folder_id {
            body["parents"] = json!([folder]);
        }

        let res = self
            .client
            .post(&url)
            .query(&[("supportsAllDrives", "true")])
            .bearer_auth(&self.access_token)
            .json(&body)
            .send()
            .map_err(FillError::DocumentRequest)?;
        let copy: CopyRes = check_status(res)?
            .json()
            .map_err(FillError::DocumentRequest)?;

        tracing::debug!("copied template {} to {}", template, copy.id);
        Ok(DocumentId::new(copy.id)?)
    }

    fn open_document(&self, id: &DocumentId) -> FillResult<Document> {
        let url = format!("{}/presentations/{}", self.slides_api_base, id);
        let res = self
            .client
            .get(&url)
            .bearer_auth(&self.access_token)
            .send()
            .map_err(FillError::DocumentRequest)?;
        let presentation: PresentationRes = check_status(res)?
            .json()
            .map_err(FillError::DocumentRequest)?;
        presentation.into_document()
    }

    fn replace_all_text(&self, id: &DocumentId, replacements: &[Replacement]) -> FillResult<()> {
        if replacements.is_empty() {
            return Ok(());
        }
        self.batch_update(id, replace_requests(replacements, None))?;
        Ok(())
    }

    fn replace_slide_text(
        &self,
        id: &DocumentId,
        slide: &SlideId,
        replacements: &[Replacement],
    ) -> FillResult<()> {
        if replacements.is_empty() {
            return Ok(());
        }
        self.batch_update(id, replace_requests(replacements, Some(slide)))?;
        Ok(())
    }

    fn duplicate_slide(&self, id: &DocumentId, slide: &SlideId) -> FillResult<SlideId> {
        let res = self.batch_update(
            id,
            vec![json!({ "duplicateObject": { "objectId": slide.as_str() } })],
        )?;
        let object_id = res
            .replies
            .first()
            .and_then(|reply| reply["duplicateObject"]["objectId"].as_str())
            .ok_or_else(|| {
                FillError::DocumentResponse("duplicateObject reply has no objectId".into())
            })?;
        Ok(SlideId::new(object_id)?)
    }

    fn remove_slide(&self, id: &DocumentId, slide: &SlideId) -> FillResult<()> {
        self.batch_update(
            id,
            vec![json!({ "deleteObject": { "objectId": slide.as_str() } })],
        )?;
        Ok(())
    }
}
