use memeplayers_types::api::{CoinRequest, CreateUserRequest};
use memeplayers_types::models::{Coin, CoinCategory, Role, User};

use crate::Database;

pub(crate) fn new_user(username: &str) -> CreateUserRequest {
    CreateUserRequest {
        username: username.to_string(),
        password: "password123".to_string(),
        email: format!("{}@example.com", username),
        avatar: None,
        bio: String::new(),
        activity_points: 0,
        role: Role::User,
    }
}

pub(crate) fn new_coin(name: &str, symbol: &str) -> CoinRequest {
    CoinRequest {
        name: name.to_string(),
        symbol: symbol.to_string(),
        description: "Test Description".to_string(),
        category: CoinCategory::Meme,
        logo: None,
    }
}

pub(crate) fn user(db: &Database, username: &str) -> User {
    db.create_user(&new_user(username), "hash").unwrap()
}

pub(crate) fn coin(db: &Database, owner: &User, symbol: &str) -> Coin {
    db.create_coin(owner.id, &new_coin(symbol, symbol)).unwrap()
}
