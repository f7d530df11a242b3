use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Status {
    pub id_str: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaUpload {
    pub media_id_string: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Account {
    pub screen_name: String,
}
