use axum::Json;

use yatube_types::api::AboutPage;

pub async fn author() -> Json<AboutPage> {
    Json(AboutPage {
        title: "Об авторе".to_string(),
        body: "Yatube is a small blogging platform: posts, groups, comments and follows."
            .to_string(),
    })
}

pub async fn tech() -> Json<AboutPage> {
    Json(AboutPage {
        title: "Технологии".to_string(),
        body: "Rust, axum, tokio, SQLite via rusqlite, argon2 and JWT for accounts.".to_string(),
    })
}
