#![forbid(unsafe_code)]

pub(super) const SQL: &str = r#"

        CREATE INDEX IF NOT EXISTS idx_story_branches_story ON story_branches(story_id, id);
        CREATE INDEX IF NOT EXISTS idx_characters_scope ON characters(story_id, branch_id, id);
        CREATE INDEX IF NOT EXISTS idx_chapters_scope ON chapters(story_id, branch_id, id);
        CREATE INDEX IF NOT EXISTS idx_scenes_scope ON scenes(story_id, branch_id, sequence_number);
        CREATE INDEX IF NOT EXISTS idx_scenes_chapter ON scenes(chapter_id, sequence_number);
        CREATE INDEX IF NOT EXISTS idx_scene_variants_scene ON scene_variants(scene_id, id);
        CREATE INDEX IF NOT EXISTS idx_scene_choices_scene ON scene_choices(scene_id, id);
        CREATE INDEX IF NOT EXISTS idx_scene_images_scene ON scene_images(scene_id, id);
        CREATE INDEX IF NOT EXISTS idx_chronicle_scope ON chronicle_entries(story_id, branch_id, sequence_number);
        CREATE INDEX IF NOT EXISTS idx_relationships_scope ON character_relationships(story_id, branch_id, id);
        CREATE INDEX IF NOT EXISTS idx_memories_scope ON character_memories(story_id, branch_id, sequence_number);
"#;
