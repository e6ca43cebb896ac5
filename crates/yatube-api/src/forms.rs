use axum::{
    Form,
    extract::{FromRequest, Multipart, Request},
    http::header,
};
use bytes::Bytes;
use serde::Deserialize;
use tracing::warn;

use yatube_types::api::BoundForm;
use yatube_types::models::Group;

use crate::error::ApiError;
use crate::media::{Image, ImageFormat};

pub const TEXT_REQUIRED: &str = "Введите текст";
pub const COMMENT_REQUIRED: &str = "Вы не написали комментарий";
pub const INVALID_GROUP: &str =
    "Выберите корректный вариант. Этого варианта нет среди допустимых значений.";
pub const INVALID_IMAGE: &str = "Загрузите правильное изображение. Файл, который вы загрузили, \
     поврежден или не является изображением.";

pub const COMMENT_MAX_CHARS: usize = 200;

// -- Post form --

/// Raw post form submission, from either a multipart or an urlencoded body.
#[derive(Debug, Default)]
pub struct PostSubmission {
    pub text: Option<String>,
    pub group: Option<String>,
    pub image: Option<Bytes>,
    /// The "clear" checkbox of the image field.
    pub clear_image: bool,
}

/// What to do with a post's image when saving the form.
#[derive(Debug)]
pub enum ImageChange {
    Keep,
    Clear,
    Replace(Image),
}

/// A post form that passed validation.
#[derive(Debug)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: ImageChange,
}

impl PostSubmission {
    /// Validates against the existing `groups`. On failure returns the bound
    /// form to re-render, carrying the submitted values.
    pub fn clean(self, groups: &[Group]) -> Result<CleanPost, BoundForm> {
        let mut form = BoundForm::default();
        let text = self.text.as_deref().unwrap_or_default().trim().to_string();
        let group_raw = self.group.as_deref().unwrap_or_default().trim().to_string();
        form.values.insert("text".to_string(), text.clone());
        form.values.insert("group".to_string(), group_raw.clone());

        if text.is_empty() {
            form.add_error("text", TEXT_REQUIRED);
        }

        let group_id = if group_raw.is_empty() {
            None
        } else {
            match group_raw.parse::<i64>() {
                Ok(id) if groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    form.add_error("group", INVALID_GROUP);
                    None
                }
            }
        };

        let image = match self.image {
            Some(bytes) => match ImageFormat::sniff(&bytes) {
                Some(format) => ImageChange::Replace(Image { format, bytes }),
                None => {
                    form.add_error("image", INVALID_IMAGE);
                    ImageChange::Keep
                }
            },
            None if self.clear_image => ImageChange::Clear,
            None => ImageChange::Keep,
        };

        if !form.is_valid() {
            return Err(form);
        }
        Ok(CleanPost {
            text,
            group_id,
            image,
        })
    }
}

/// Initial values of the edit form for an existing post.
pub fn post_initial(text: &str, group_id: Option<i64>) -> BoundForm {
    let mut form = BoundForm::default();
    form.values.insert("text".to_string(), text.to_string());
    form.values.insert(
        "group".to_string(),
        group_id.map(|id| id.to_string()).unwrap_or_default(),
    );
    form
}

impl<S> FromRequest<S> for PostSubmission
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_ascii_lowercase);

        match content_type {
            Some(ct) if ct.starts_with("multipart/form-data") => {
                let multipart = Multipart::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                read_multipart(multipart).await
            }
            Some(_) => {
                let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state)
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                let mut submission = PostSubmission::default();
                for (name, value) in fields {
                    match name.as_str() {
                        "text" => submission.text = Some(value),
                        "group" => submission.group = Some(value),
                        "image-clear" => submission.clear_image = true,
                        _ => {}
                    }
                }
                Ok(submission)
            }
            // An empty POST binds an empty form, which then fails validation.
            None => Ok(PostSubmission::default()),
        }
    }
}

async fn read_multipart(mut multipart: Multipart) -> Result<PostSubmission, ApiError> {
    let mut submission = PostSubmission::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "text" => {
                submission.text = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.body_text()))?,
                );
            }
            "group" => {
                submission.group = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::BadRequest(e.body_text()))?,
                );
            }
            "image" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(e.body_text()))?;
                // Browsers send an empty part when no file was chosen.
                if !bytes.is_empty() {
                    submission.image = Some(bytes);
                }
            }
            "image-clear" => submission.clear_image = true,
            other => warn!("Ignoring unknown post form field '{}'", other),
        }
    }
    Ok(submission)
}

// -- Comment form --

#[derive(Debug, Default, Deserialize)]
pub struct CommentSubmission {
    #[serde(default)]
    pub text: Option<String>,
}

impl CommentSubmission {
    pub fn clean(self) -> Result<String, BoundForm> {
        let mut form = BoundForm::default();
        let text = self.text.as_deref().unwrap_or_default().trim().to_string();
        form.values.insert("text".to_string(), text.clone());

        let chars = text.chars().count();
        if chars == 0 {
            form.add_error("text", COMMENT_REQUIRED);
        } else if chars > COMMENT_MAX_CHARS {
            form.add_error(
                "text",
                format!(
                    "Убедитесь, что это значение содержит не более {} символов (сейчас {}).",
                    COMMENT_MAX_CHARS, chars
                ),
            );
        }

        if form.is_valid() { Ok(text) } else { Err(form) }
    }
}
