#[derive(Debug, thiserror::Error)]
pub enum FillError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid text value: {0}")]
    Text(#[from] filler_types::TextError),

    #[error("record is missing the `{0}` group")]
    MissingGroup(&'static str),
    #[error("failed to decode record at `{path}`: {source}")]
    RecordDecode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("record `{0}` not found in source")]
    RecordNotFound(String),
    #[error("request body has no `data` member")]
    MissingEnvelope,
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to fetch record: {0}")]
    RecordRequest(reqwest::Error),
    #[error("record source answered with status {status}: {body}")]
    RecordStatus { status: u16, body: String },

    #[error("document store request failed: {0}")]
    DocumentRequest(reqwest::Error),
    #[error("document store answered with status {status}: {body}")]
    DocumentApi { status: u16, body: String },
    #[error("unexpected document store response: {0}")]
    DocumentResponse(String),
    #[error("document not found: {0}")]
    DocumentNotFound(String),
    #[error("slide {slide} not found in document {document}")]
    SlideNotFound { document: String, slide: String },
    #[error("no slide carries the exam prototype marker {0}")]
    PrototypeSlideNotFound(&'static str),
    #[error("failed to decode deck at `{path}`: {source}")]
    DeckDecode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to serialize deck: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to write deck file: {0}")]
    FileWrite(std::io::Error),

    #[error("history extraction failed: {0}")]
    Extraction(String),
    #[error("extraction request failed: {0}")]
    ExtractionRequest(reqwest::Error),
}

impl FillError {
    /// True when the failure was caused by the caller's input rather than by a
    /// collaborator, so HTTP surfaces can answer 4xx instead of 5xx.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            FillError::MissingGroup(_)
                | FillError::RecordDecode { .. }
                | FillError::RecordNotFound(_)
                | FillError::MissingEnvelope
                | FillError::Text(_)
        )
    }

    /// True for failures raised by the document store or another upstream service.
    pub fn is_upstream_error(&self) -> bool {
        matches!(
            self,
            FillError::DocumentRequest(_)
                | FillError::DocumentApi { .. }
                | FillError::DocumentResponse(_)
                | FillError::DocumentNotFound(_)
                | FillError::SlideNotFound { .. }
                | FillError::PrototypeSlideNotFound(_)
                | FillError::RecordRequest(_)
                | FillError::RecordStatus { .. }
        )
    }
}

pub type FillResult<T> = std::result::Result<T, FillError>;
