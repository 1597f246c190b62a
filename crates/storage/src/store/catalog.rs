#![forbid(unsafe_code)]

use sf_core::{CloneConfig, FieldValue, SchemaRegistry, SqlFilter, branch_suffix};

pub const CHARACTER: &str = "Character";
pub const CHAPTER: &str = "Chapter";
pub const SCENE: &str = "Scene";
pub const SCENE_VARIANT: &str = "SceneVariant";
pub const SCENE_CHOICE: &str = "SceneChoice";
pub const SCENE_IMAGE: &str = "SceneImage";
pub const CHRONICLE_ENTRY: &str = "ChronicleEntry";
pub const CHARACTER_RELATIONSHIP: &str = "CharacterRelationship";
pub const CHARACTER_MEMORY: &str = "CharacterMemory";

/// Clone rules for every table of the story schema.
pub fn story_catalog() -> SchemaRegistry {
    let mut registry = SchemaRegistry::new();

    // The roster is reference data: every fork gets all of it.
    registry.register(
        CloneConfig::new(CHARACTER, "characters")
            .priority(10)
            .clone_all()
            .creates_mapping(),
    );

    registry.register(
        CloneConfig::new(CHAPTER, "chapters")
            .priority(20)
            .creates_mapping()
            .filter(|scope| {
                SqlFilter::new(
                    "EXISTS (SELECT 1 FROM scenes s \
                     WHERE s.chapter_id = chapters.id AND s.sequence_number <= ?)",
                    vec![FieldValue::Integer(scope.cutoff)],
                )
            }),
    );

    registry.register(
        CloneConfig::new(SCENE, "scenes")
            .priority(30)
            .depends_on([CHAPTER])
            .remap("chapter_id", CHAPTER)
            .self_ref("parent_scene_id")
            .cutoff_on("sequence_number")
            .creates_mapping()
            .nested(SCENE_CHOICE, "scene_id"),
    );

    registry.register(
        CloneConfig::new(SCENE_CHOICE, "scene_choices")
            .priority(35)
            .unscoped()
            .deferred("leads_to_scene_id", SCENE),
    );

    registry.register(
        CloneConfig::new(SCENE_VARIANT, "scene_variants")
            .priority(40)
            .depends_on([SCENE])
            .unscoped()
            .remap("scene_id", SCENE)
            .via_mapping(SCENE),
    );

    registry.register(
        CloneConfig::new(SCENE_IMAGE, "scene_images")
            .priority(41)
            .depends_on([SCENE])
            .unscoped()
            .remap("scene_id", SCENE)
            .via_mapping(SCENE),
    );

    registry.register(
        CloneConfig::new(CHRONICLE_ENTRY, "chronicle_entries")
            .priority(50)
            .depends_on([SCENE])
            .remap("scene_id", SCENE)
            .cutoff_on("sequence_number")
            .special("embedding_id", branch_suffix)
            .reset("is_summarized", false),
    );

    registry.register(
        CloneConfig::new(CHARACTER_RELATIONSHIP, "character_relationships")
            .priority(60)
            .depends_on([CHARACTER])
            .remap("character_a_id", CHARACTER)
            .remap("character_b_id", CHARACTER)
            .cutoff_on("established_sequence"),
    );

    registry.register(
        CloneConfig::new(CHARACTER_MEMORY, "character_memories")
            .priority(70)
            .depends_on([CHARACTER, SCENE])
            .remap("character_id", CHARACTER)
            .remap("scene_id", SCENE)
            .cutoff_on("sequence_number")
            .special("embedding_id", branch_suffix),
    );

    registry
}
