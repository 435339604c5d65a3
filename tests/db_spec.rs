use guidebook::db::Database;
use guidebook::models::*;
use guidebook_core::*;
use speculate2::speculate;
use uuid::Uuid;

fn create_test_guide(db: &Database) -> Guide {
    db.create_guide(CreateGuideInput {
        title: "Getting Started".to_string(),
        description: "First steps".to_string(),
    })
    .expect("Failed to create guide")
}

/// An editor on `guide` with two chapters, the first holding two written
/// sections.
fn edited_outline(db: &Database, guide: Uuid) -> OutlineEditor {
    let mut editor = OutlineEditor::open(db, guide).expect("Failed to open editor");
    let intro = editor.add_chapter().value;
    editor
        .update_chapter_meta(&intro, "Introduction", "Where to begin")
        .expect("chapter exists");
    for (title, body) in [("Welcome", "Hello there"), ("Setup", "Install the tools")] {
        let section = editor.add_section(&intro).expect("chapter exists").value;
        editor.begin_edit(&section).expect("section exists");
        editor
            .update_draft(Some(title.to_string()), Some(body.to_string()))
            .expect("session open");
        editor.commit_edit();
    }
    editor.add_chapter();
    editor
}

speculate! {
    before {
        let db = Database::open_memory().expect("Failed to create in-memory database");
        db.migrate().expect("Failed to run migrations");
    }

    describe "guides" {
        describe "create_guide" {
            it "creates an unpublished guide" {
                let guide = create_test_guide(&db);

                assert_eq!(guide.title, "Getting Started");
                assert_eq!(guide.description, "First steps");
                assert!(guide.published_at.is_none());
            }
        }

        describe "get_guide" {
            it "returns None for non-existent guide" {
                let result = db.get_guide(Uuid::new_v4()).expect("Query failed");
                assert!(result.is_none());
            }

            it "returns the guide by id" {
                let created = create_test_guide(&db);

                let found = db.get_guide(created.id).expect("Query failed").expect("Guide missing");
                assert_eq!(found.id, created.id);
                assert_eq!(found.title, created.title);
            }
        }

        describe "list_guides" {
            it "returns empty list when no guides exist" {
                assert!(db.list_guides().expect("Query failed").is_empty());
            }

            it "counts published chapters and sections" {
                let guide = create_test_guide(&db);
                let editor = edited_outline(&db, guide.id);
                editor.publish(&db, guide.id).expect("Failed to publish");

                let summaries = db.list_guides().expect("Query failed");
                assert_eq!(summaries.len(), 1);
                assert_eq!(summaries[0].chapter_count, 2);
                assert_eq!(summaries[0].section_count, 2);
            }
        }

        describe "delete_guide" {
            it "returns false for non-existent guide" {
                assert!(!db.delete_guide(Uuid::new_v4()).expect("Delete failed"));
            }

            it "removes the guide and its outline" {
                let guide = create_test_guide(&db);
                edited_outline(&db, guide.id).publish(&db, guide.id).expect("Failed to publish");

                assert!(db.delete_guide(guide.id).expect("Delete failed"));
                assert!(db.get_guide(guide.id).expect("Query failed").is_none());
                assert!(db.load_outline(guide.id).is_err());
            }
        }
    }

    describe "outline source" {
        it "loads a new guide as an empty outline" {
            let guide = create_test_guide(&db);

            let outline = db.load_outline(guide.id).expect("Failed to load");
            assert_eq!(outline.title, "Getting Started");
            assert_eq!(outline.description, "First steps");
            assert!(outline.chapters().is_empty());
        }

        it "fails for an unknown guide" {
            assert!(db.load_outline(Uuid::new_v4()).is_err());
        }

        it "returns None for content that was never stored" {
            let guide = create_test_guide(&db);
            let content = db
                .load_content(guide.id, &SectionId::from("c1s1"))
                .expect("Query failed");
            assert!(content.is_none());
        }
    }

    describe "publish" {
        it "round-trips outline and content" {
            let guide = create_test_guide(&db);
            let editor = edited_outline(&db, guide.id);
            editor.publish(&db, guide.id).expect("Failed to publish");

            let outline = db.load_outline(guide.id).expect("Failed to load");
            let content = db.load_all_content(guide.id, &outline).expect("Failed to load content");

            assert_eq!(&outline, editor.outline());
            assert_eq!(&content, editor.content());
        }

        it "preserves order, flags and durations" {
            let guide = create_test_guide(&db);
            let mut editor = edited_outline(&db, guide.id);
            let first = ChapterId::from("chapter1");
            let setup = SectionId::from("c1s2");
            editor.move_section(&first, &setup, Direction::Up).expect("section exists");
            editor.set_section_completed(&setup, true).expect("section exists");
            editor.set_section_duration(&setup, "10 min").expect("section exists");
            editor.move_chapter(&first, Direction::Down).expect("chapter exists");
            editor.publish(&db, guide.id).expect("Failed to publish");

            let outline = db.load_outline(guide.id).expect("Failed to load");
            let chapter_ids: Vec<_> = outline.chapter_ids().map(|id| id.as_str()).collect();
            assert_eq!(chapter_ids, vec!["chapter2", "chapter1"]);

            let (_, section) = outline.find_section(&setup).expect("section stored");
            assert!(section.completed);
            assert_eq!(section.duration, "10 min");
            let section_ids: Vec<_> = outline.section_ids().map(|id| id.as_str()).collect();
            assert_eq!(section_ids, vec!["c1s2", "c1s1"]);
        }

        it "replaces what was published before" {
            let guide = create_test_guide(&db);
            let mut editor = edited_outline(&db, guide.id);
            editor.publish(&db, guide.id).expect("Failed to publish");

            editor.delete_chapter(&ChapterId::from("chapter1")).expect("chapter exists");
            editor.update_outline_meta("Renamed", "");
            editor.publish(&db, guide.id).expect("Failed to publish");

            let outline = db.load_outline(guide.id).expect("Failed to load");
            assert_eq!(outline.title, "Renamed");
            assert_eq!(outline.chapters().len(), 1);
            assert_eq!(outline.section_count(), 0);
            let content = db
                .load_content(guide.id, &SectionId::from("c1s1"))
                .expect("Query failed");
            assert!(content.is_none());
        }

        it "stamps published_at" {
            let guide = create_test_guide(&db);
            edited_outline(&db, guide.id).publish(&db, guide.id).expect("Failed to publish");

            let stored = db.get_guide(guide.id).expect("Query failed").expect("Guide missing");
            assert!(stored.published_at.is_some());
        }

        it "does not store an unsaved draft" {
            let guide = create_test_guide(&db);
            let mut editor = edited_outline(&db, guide.id);
            let welcome = SectionId::from("c1s1");
            editor.begin_edit(&welcome).expect("section exists");
            editor.update_draft(None, Some("Unsaved".to_string())).expect("session open");
            editor.publish(&db, guide.id).expect("Failed to publish");

            let entry = db
                .load_content(guide.id, &welcome)
                .expect("Query failed")
                .expect("content stored");
            assert_eq!(entry.body, "Hello there");
        }

        it "fails for an unknown guide" {
            let editor = OutlineEditor::empty("Nowhere");
            assert!(editor.publish(&db, Uuid::new_v4()).is_err());
        }

        it "keeps generating fresh ids after a reload" {
            let guide = create_test_guide(&db);
            let mut editor = edited_outline(&db, guide.id);
            editor.delete_section(&SectionId::from("c1s2")).expect("section exists");
            editor.publish(&db, guide.id).expect("Failed to publish");

            let mut reopened = OutlineEditor::open(&db, guide.id).expect("Failed to open");
            let added = reopened.add_section(&ChapterId::from("chapter1")).expect("chapter exists");
            assert_ne!(added.value.as_str(), "c1s1");
            let chapter = reopened.add_chapter().value;
            assert_eq!(chapter.as_str(), "chapter3");
        }
    }

    describe "on-disk database" {
        it "persists across reopen" {
            let dir = tempfile::tempdir().expect("Failed to create temp dir");
            let path = dir.path().join("nested").join("guidebook.db");

            let guide_id = {
                let db = Database::open(path.clone()).expect("Failed to open database");
                db.migrate().expect("Failed to migrate");
                let guide = create_test_guide(&db);
                edited_outline(&db, guide.id).publish(&db, guide.id).expect("Failed to publish");
                guide.id
            };

            let db = Database::open(path).expect("Failed to reopen database");
            db.migrate().expect("Failed to migrate");
            let outline = db.load_outline(guide_id).expect("Failed to load");
            assert_eq!(outline.section_count(), 2);
        }
    }
}
