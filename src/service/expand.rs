//! Embed related records into read results.

use super::CrudService;
use crate::config::{EntityDefinition, RelationDefinition, RelationKind, Registry, ID_COLUMN};
use crate::error::AppError;
use crate::value::{FieldValue, Record};
use sqlx::SqlitePool;

/// Embed the relations named by `tokens` into each row.
///
/// A token matches the first relation whose target entity name equals it, singular or
/// plural, ignoring case. Unmatched tokens are ignored. belongs_to embeds the target row under the
/// singular key (absent when the foreign key is null or dangling); has_many embeds a list,
/// possibly empty, under the plural key. One query per row per relation.
pub async fn expand(
    pool: &SqlitePool,
    registry: &Registry,
    entity: &EntityDefinition,
    rows: &mut [Record],
    tokens: &[String],
) -> Result<(), AppError> {
    for rel in matched_relations(entity, tokens) {
        let Some(target) = registry.entity_by_name(&rel.entity) else {
            continue;
        };
        let key = rel.embed_key();
        for row in rows.iter_mut() {
            match rel.kind {
                RelationKind::BelongsTo => {
                    let Some(fk) = row.get(&rel.field).filter(|v| !v.is_null()).cloned() else {
                        continue;
                    };
                    if let Some(related) = CrudService::read(pool, target, &fk).await? {
                        row.insert(key.clone(), FieldValue::Object(related));
                    }
                }
                RelationKind::HasMany => {
                    let Some(id) = row.get(ID_COLUMN).cloned() else {
                        continue;
                    };
                    let children = CrudService::fetch_where(pool, target, &rel.field, &id).await?;
                    row.insert(
                        key.clone(),
                        FieldValue::List(children.into_iter().map(FieldValue::Object).collect()),
                    );
                }
            }
        }
    }
    Ok(())
}

/// For each token, the first relation in declaration order that it names. Each relation at most once.
fn matched_relations<'a>(entity: &'a EntityDefinition, tokens: &[String]) -> Vec<&'a RelationDefinition> {
    let mut matched: Vec<&RelationDefinition> = Vec::new();
    for token in tokens {
        let Some(rel) = entity.relations.iter().find(|rel| rel.matches_token(token)) else {
            continue;
        };
        if !matched.iter().any(|m| std::ptr::eq(*m, rel)) {
            matched.push(rel);
        }
    }
    matched
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{from_yaml_str, resolve};

    #[test]
    fn tokens_match_singular_or_plural_any_case() {
        let yaml = r#"
entities:
  - name: User
    fields:
      - { name: name, type: string }
    relations:
      - { type: has_many, entity: Profile, field: user_id }
  - name: Profile
    fields:
      - { name: user_id, type: int }
    relations:
      - { type: belongs_to, entity: User, field: user_id }
"#;
        let reg = resolve(&from_yaml_str(yaml).unwrap()).unwrap();
        let user = reg.entity_by_name("User").unwrap();
        let profile = reg.entity_by_name("Profile").unwrap();

        let tokens = |t: &[&str]| t.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        assert_eq!(matched_relations(user, &tokens(&["PROFILES"])).len(), 1);
        assert_eq!(matched_relations(user, &tokens(&["profile"])).len(), 1);
        assert_eq!(matched_relations(user, &tokens(&["posts"])).len(), 0);
        assert_eq!(matched_relations(profile, &tokens(&["user", "users"])).len(), 1);
        assert_eq!(matched_relations(profile, &tokens(&["User"]))[0].embed_key(), "user");
        assert_eq!(matched_relations(user, &tokens(&["profile"]))[0].embed_key(), "profiles");
    }

    #[test]
    fn token_picks_first_relation_to_a_shared_target() {
        let yaml = r#"
entities:
  - name: User
    fields:
      - { name: name, type: string }
  - name: Post
    fields:
      - { name: author_id, type: int }
      - { name: editor_id, type: int }
    relations:
      - { type: belongs_to, entity: User, field: author_id }
      - { type: belongs_to, entity: User, field: editor_id }
"#;
        let reg = resolve(&from_yaml_str(yaml).unwrap()).unwrap();
        let post = reg.entity_by_name("Post").unwrap();
        let tokens = vec!["user".to_string(), "users".to_string()];
        let matched = matched_relations(post, &tokens);
        assert_eq!(matched.len(), 1);
        assert_eq!(matched[0].field, "author_id");
    }
}
