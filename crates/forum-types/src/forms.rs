use serde::Deserialize;

// -- Auth --

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

// -- Threads / posts --

#[derive(Debug, Deserialize)]
pub struct NewThreadForm {
    pub title: String,
}

#[derive(Debug, Deserialize)]
pub struct NewPostForm {
    pub content: String,
}
