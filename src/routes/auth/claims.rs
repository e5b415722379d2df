use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
pub struct Claims {
    pub id: String, // user id, matches users._id
    pub email: String,
    pub exp: usize, // expiration (as UNIX timestamp)
    #[serde(default)]
    pub iss: String,
    #[serde(default)]
    pub aud: String,
}
