//! The archive against real generated posts, on disk.

use hurl_core::{FeedSystem, GenerateParams, SystemConfig};
use hurl_store::PostArchive;

#[tokio::test]
async fn generated_posts_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("hurl.db");

    let system = FeedSystem::new(SystemConfig {
        generated_personas: 5,
        ..SystemConfig::default()
    });
    let posts = system
        .generate(&GenerateParams {
            toxicity_max: 1.0,
            ..GenerateParams::new(12).with_seed(42)
        })
        .await
        .unwrap();

    {
        let archive = PostArchive::open(&path).unwrap();
        assert_eq!(archive.append_batch(&posts).unwrap(), 12);
    }

    let archive = PostArchive::open(&path).unwrap();
    assert_eq!(archive.count().unwrap(), 12);
    assert_eq!(archive.recent(12).unwrap(), posts);
    assert_eq!(archive.get(&posts[5].id).unwrap().as_ref(), Some(&posts[5]));

    let persona = &posts[0].persona_id;
    let theirs = archive.by_persona(persona, 100).unwrap();
    assert!(!theirs.is_empty());
    assert!(theirs.iter().all(|p| &p.persona_id == persona));
}
