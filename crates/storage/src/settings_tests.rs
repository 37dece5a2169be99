use super::*;
use crate::pool::open_in_memory;

#[tokio::test]
async fn unknown_key_is_none() {
    let repo = SettingsRepo::new(open_in_memory().await.unwrap());
    assert_eq!(repo.get("missing").await.unwrap(), None);
}

#[tokio::test]
async fn set_then_get_round_trips() {
    let repo = SettingsRepo::new(open_in_memory().await.unwrap());
    repo.set("theme", "dark").await.unwrap();
    assert_eq!(repo.get("theme").await.unwrap(), Some("dark".into()));
}

#[tokio::test]
async fn set_overwrites_previous_value() {
    let repo = SettingsRepo::new(open_in_memory().await.unwrap());
    repo.set("theme", "dark").await.unwrap();
    repo.set("theme", "light").await.unwrap();
    assert_eq!(repo.get("theme").await.unwrap(), Some("light".into()));
    assert_eq!(repo.all().await.unwrap().len(), 1);
}
