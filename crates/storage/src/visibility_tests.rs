use super::*;
use crate::pool::open_in_memory;

#[tokio::test]
async fn hidden_groups_empty_by_default() {
    let repo = VisibilityRepo::new(open_in_memory().await.unwrap());
    assert!(repo.hidden_groups(1).await.unwrap().is_empty());
}

#[tokio::test]
async fn set_hidden_then_unhidden() {
    let repo = VisibilityRepo::new(open_in_memory().await.unwrap());
    repo.set_hidden(1, "gpu", true).await.unwrap();
    assert_eq!(repo.hidden_groups(1).await.unwrap(), vec!["gpu".to_string()]);

    repo.set_hidden(1, "gpu", false).await.unwrap();
    assert!(repo.hidden_groups(1).await.unwrap().is_empty());
}
