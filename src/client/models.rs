//! View models for model management.
//!
//! [`ModelPanel`] tracks one model's load/unload controls and status line;
//! [`DownloadPanel`] tracks a download submission. Both are plain state that
//! the CLI and the dashboard render; the network calls go through
//! [`ApiClient`].

use thiserror::Error;

use super::{ActionResponse, ApiClient, ClientError, DownloadRequest};
use crate::config::schema::Locale;

// ---------------------------------------------------------------------------
// Status line
// ---------------------------------------------------------------------------

/// What a model panel currently says about its model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusLine {
    Idle,
    Loading,
    Unloading,
    Loaded,
    Unloaded,
    /// Server-reported failure, shown verbatim.
    Error(String),
    /// The server could not be reached.
    ConnectionError,
}

impl StatusLine {
    pub fn text(&self, locale: Locale) -> String {
        match (self, locale) {
            (Self::Idle, _) => String::new(),
            (Self::Loading, Locale::Pt) => "Carregando modelo...".to_string(),
            (Self::Loading, Locale::En) => "Loading model...".to_string(),
            (Self::Unloading, Locale::Pt) => "Descarregando modelo...".to_string(),
            (Self::Unloading, Locale::En) => "Unloading model...".to_string(),
            (Self::Loaded, Locale::Pt) => "Modelo carregado!".to_string(),
            (Self::Loaded, Locale::En) => "Model loaded!".to_string(),
            (Self::Unloaded, Locale::Pt) => "Modelo descarregado".to_string(),
            (Self::Unloaded, Locale::En) => "Model unloaded".to_string(),
            (Self::Error(e), Locale::Pt) => format!("Erro: {e}"),
            (Self::Error(e), Locale::En) => format!("Error: {e}"),
            (Self::ConnectionError, Locale::Pt) => "Erro de conexão".to_string(),
            (Self::ConnectionError, Locale::En) => "Connection error".to_string(),
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Error(_) | Self::ConnectionError)
    }
}

// ---------------------------------------------------------------------------
// Model panel
// ---------------------------------------------------------------------------

/// Controls and status of a single model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelPanel {
    pub model_id: String,
    pub load_enabled: bool,
    pub unload_enabled: bool,
    pub status: StatusLine,
}

impl ModelPanel {
    /// A panel for a model whose current load state is `loaded`.
    pub fn new(model_id: impl Into<String>, loaded: bool) -> Self {
        Self {
            model_id: model_id.into(),
            load_enabled: !loaded,
            unload_enabled: loaded,
            status: StatusLine::Idle,
        }
    }

    /// Load the model through `client`, updating the panel before and after.
    pub fn load(&mut self, client: &ApiClient) -> &StatusLine {
        self.begin_load();
        let result = client.load_model(&self.model_id);
        self.finish_load(result);
        &self.status
    }

    /// Unload the model through `client`, updating the panel before and after.
    pub fn unload(&mut self, client: &ApiClient) -> &StatusLine {
        self.begin_unload();
        let result = client.unload_model(&self.model_id);
        self.finish_unload(result);
        &self.status
    }

    pub fn begin_load(&mut self) {
        self.load_enabled = false;
        self.status = StatusLine::Loading;
    }

    pub fn finish_load(&mut self, result: Result<ActionResponse, ClientError>) {
        match result {
            Ok(_) => {
                self.status = StatusLine::Loaded;
                self.unload_enabled = true;
            }
            Err(e) => {
                self.status = failure_status(e);
                self.load_enabled = true;
            }
        }
    }

    pub fn begin_unload(&mut self) {
        self.unload_enabled = false;
        self.status = StatusLine::Unloading;
    }

    pub fn finish_unload(&mut self, result: Result<ActionResponse, ClientError>) {
        match result {
            Ok(_) => {
                self.status = StatusLine::Unloaded;
                self.load_enabled = true;
                self.unload_enabled = false;
            }
            Err(e) => {
                self.status = failure_status(e);
                self.unload_enabled = true;
            }
        }
    }
}

fn failure_status(error: ClientError) -> StatusLine {
    match error {
        ClientError::Application(message) => StatusLine::Error(message),
        ClientError::Status(status) => StatusLine::Error(format!("HTTP {status}")),
        ClientError::Transport(_) => StatusLine::ConnectionError,
    }
}

// ---------------------------------------------------------------------------
// Download form and panel
// ---------------------------------------------------------------------------

/// Raw download form input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadForm {
    pub username: String,
    pub repo: String,
    pub token: String,
    pub path: String,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DownloadFormError {
    #[error("username and repository are required")]
    MissingFields,
}

impl DownloadForm {
    /// Trim every field and require a username and a repository.
    pub fn validate(&self) -> Result<DownloadRequest, DownloadFormError> {
        let username = self.username.trim();
        let repo = self.repo.trim();
        if username.is_empty() || repo.is_empty() {
            return Err(DownloadFormError::MissingFields);
        }
        Ok(DownloadRequest {
            username: username.to_string(),
            repo: repo.to_string(),
            token: self.token.trim().to_string(),
            path: self.path.trim().to_string(),
        })
    }
}

/// Progress of a model download.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DownloadState {
    #[default]
    Idle,
    /// `username/repo` being fetched.
    InProgress(String),
    Succeeded,
    Failed(String),
    ConnectionFailed(String),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DownloadPanel {
    pub state: DownloadState,
}

impl DownloadPanel {
    /// Validate `form` and run the download. A validation failure leaves the
    /// panel untouched and sends nothing.
    pub fn submit(
        &mut self,
        client: &ApiClient,
        form: &DownloadForm,
    ) -> Result<&DownloadState, DownloadFormError> {
        let request = form.validate()?;
        self.begin(&request);
        let result = client.download_model(&request);
        self.finish(result);
        Ok(&self.state)
    }

    pub fn begin(&mut self, request: &DownloadRequest) {
        self.state = DownloadState::InProgress(format!("{}/{}", request.username, request.repo));
    }

    pub fn finish(&mut self, result: Result<ActionResponse, ClientError>) {
        self.state = match result {
            Ok(_) => DownloadState::Succeeded,
            Err(ClientError::Transport(e)) => DownloadState::ConnectionFailed(e),
            Err(e) => DownloadState::Failed(e.to_string()),
        };
    }

    pub fn text(&self, locale: Locale) -> String {
        match (&self.state, locale) {
            (DownloadState::Idle, _) => String::new(),
            (DownloadState::InProgress(name), Locale::Pt) => format!(
                "Baixando modelo {name}... Este processo pode levar alguns minutos."
            ),
            (DownloadState::InProgress(name), Locale::En) => {
                format!("Downloading model {name}... This may take a few minutes.")
            }
            (DownloadState::Succeeded, Locale::Pt) => "Modelo baixado com sucesso!".to_string(),
            (DownloadState::Succeeded, Locale::En) => "Model downloaded successfully!".to_string(),
            (DownloadState::Failed(e), Locale::Pt) => format!("Erro ao baixar modelo: {e}"),
            (DownloadState::Failed(e), Locale::En) => format!("Model download failed: {e}"),
            (DownloadState::ConnectionFailed(e), Locale::Pt) => format!("Erro de conexão: {e}"),
            (DownloadState::ConnectionFailed(e), Locale::En) => format!("Connection error: {e}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
