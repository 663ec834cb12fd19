use axum::{
    extract::State,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    Form,
};
use log::{debug, error};
use serde::Deserialize;

use super::page::IndexPage;
use super::AppState;
use crate::classifier::{ClassifierError, GithubIssue};

/// The posted form. Field names match the page's inputs; missing fields bind
/// as empty text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct InputForm {
    #[serde(rename = "Input.Title", default)]
    pub title: String,
    #[serde(rename = "Input.Description", default)]
    pub description: String,
}

/// A failed prediction. Details go to the log, never to the page.
#[derive(Debug)]
pub struct PageError(ClassifierError);

impl From<ClassifierError> for PageError {
    fn from(err: ClassifierError) -> Self {
        Self(err)
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        error!("Prediction failed: {}", self.0);
        StatusCode::INTERNAL_SERVER_ERROR.into_response()
    }
}

pub async fn index() -> Html<String> {
    Html(IndexPage::default().render())
}

pub async fn submit(
    State(state): State<AppState>,
    Form(input): Form<InputForm>,
) -> Result<Html<String>, PageError> {
    let mut page = IndexPage {
        input,
        predicted_area: None,
    };

    let Some(labeler) = state.labeler.as_ref() else {
        debug!("No model loaded; rendering the form without a prediction");
        return Ok(Html(page.render()));
    };

    let issue = GithubIssue::new(page.input.title.clone(), page.input.description.clone());
    let prediction = labeler.predict_label(&issue)?;
    debug!("Predicted '{}' for title {:?}", prediction.area, issue.title);

    page.predicted_area = Some(prediction.area);
    Ok(Html(page.render()))
}
