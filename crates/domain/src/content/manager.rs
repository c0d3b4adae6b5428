//! Save orchestration for contents.
//!
//! Every locale touched since the last save is validated against the
//! content type before anything is appended:
//! 1. values of fields outside the locale's scope are rejected
//! 2. each value is checked by the validator of its field type
//! 3. a published locale must hold every required field
//! 4. unique field values must not be used by another content

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use event_store::{ClaimSet, EventStoreError};
use futures_util::future::join_all;

use crate::aggregate::Aggregate;
use crate::content_type::{ContentType, FieldDefinition};
use crate::error::{ConflictError, DomainError};
use crate::field_type::FieldType;
use crate::fields::{FieldValueValidator, FieldValueValidatorFactory};
use crate::queriers::ContentQuerier;
use crate::repository::{ContentRepository, FieldTypeRepository};
use crate::uniqueness::{
    UNIQUE_NAME_KEY, content_scope, field_value_claim, parse_field_key, record_conflict,
    unique_name_claim,
};
use crate::validation::{ValidationError, ValidationFailure, codes};
use crate::value_objects::{ContentId, ContentTypeId, FieldId, FieldTypeId, LanguageId};

use super::{Content, ContentLocale};

type Validators = HashMap<FieldTypeId, Box<dyn FieldValueValidator>>;

/// Validates contents against their content type and persists them with
/// their unique claims.
pub struct ContentManager {
    contents: Arc<dyn ContentRepository>,
    field_types: Arc<dyn FieldTypeRepository>,
    querier: Arc<dyn ContentQuerier>,
    validators: FieldValueValidatorFactory,
}

impl ContentManager {
    pub fn new(
        contents: Arc<dyn ContentRepository>,
        field_types: Arc<dyn FieldTypeRepository>,
        querier: Arc<dyn ContentQuerier>,
        validators: FieldValueValidatorFactory,
    ) -> Self {
        Self {
            contents,
            field_types,
            querier,
            validators,
        }
    }

    /// Saves a content of the given content type.
    ///
    /// Nothing is persisted unless every touched locale is valid. On failure
    /// the content keeps its pending events.
    #[tracing::instrument(
        skip_all,
        fields(content_id = ?content.id(), content_type_id = ?content_type.id())
    )]
    pub async fn save(
        &self,
        content: &mut Content,
        content_type: &ContentType,
    ) -> Result<(), DomainError> {
        if !content.has_changes() {
            return Ok(());
        }
        let content_id = content.content_id()?;
        let content_type_id = content_type.content_type_id()?;
        let expected = content.content_type_id()?;
        if expected != content_type_id {
            return Err(DomainError::ContentTypeMismatch {
                content_id,
                expected,
                actual: content_type_id,
            });
        }

        let result = self.check(content, content_type).await;
        if let Err(DomainError::Validation(error)) = &result {
            metrics::counter!("content_validation_failures_total")
                .increment(error.failures.len() as u64);
        }
        let LocaleClaims { set, scopes } = result?;

        if let Err(error) = self.contents.save(content, set).await {
            return Err(into_content_conflict(error, content, content_type_id, &scopes));
        }

        metrics::counter!("content_saves_total").increment(1);
        tracing::debug!(locales = scopes.len(), "content saved");
        Ok(())
    }

    /// Runs every check and returns the claims to record with the save.
    async fn check(
        &self,
        content: &Content,
        content_type: &ContentType,
    ) -> Result<LocaleClaims, DomainError> {
        let content_type_id = content_type.content_type_id()?;

        if content.is_deleted() {
            let mut set = ClaimSet::none().release(content_scope(content_type_id, None));
            for language_id in content.languages().into_iter().chain(content.removed_languages()) {
                set = set.release(content_scope(content_type_id, Some(language_id)));
            }
            return Ok(LocaleClaims {
                set,
                scopes: Vec::new(),
            });
        }

        if content_type.is_invariant() {
            let failures: Vec<_> = content
                .languages()
                .into_iter()
                .map(|language_id| {
                    ValidationFailure::new(
                        codes::INVARIANT_CONTENT_TYPE,
                        "An invariant content type cannot have language locales.",
                        "Locales",
                    )
                    .with_value(language_id.to_string())
                })
                .collect();
            if !failures.is_empty() {
                return Err(ValidationError::new(failures).into());
            }
        }

        let touched = content.touched_locale_keys();
        if !touched.is_empty() {
            let validators = self.load_validators(content_type).await?;
            let checks = touched
                .iter()
                .map(|key| self.check_locale(content, content_type, *key, &validators));
            for result in join_all(checks).await {
                result?;
            }
        }

        let mut set = ClaimSet::none();
        for language_id in content.removed_languages() {
            set = set.release(content_scope(content_type_id, Some(language_id)));
        }
        let mut scopes = Vec::with_capacity(touched.len());
        for key in touched {
            let Some(locale) = content.find_locale(key) else {
                continue;
            };
            let scope = content_scope(content_type_id, key);
            set = set
                .release(scope.clone())
                .claim(unique_name_claim(&scope, locale.unique_name()));
            for (field_id, value) in unique_values(content_type, key, locale) {
                set = set.claim(field_value_claim(&scope, field_id, &value));
            }
            scopes.push((scope, key));
        }
        Ok(LocaleClaims { set, scopes })
    }

    /// Loads the field types of the content type and builds their validators.
    async fn load_validators(&self, content_type: &ContentType) -> Result<Validators, DomainError> {
        let ids: BTreeSet<FieldTypeId> = content_type
            .fields()
            .iter()
            .map(|field| field.field_type_id)
            .collect();
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let ids: Vec<_> = ids.into_iter().collect();
        let field_types = self.field_types.load_many(&ids).await?;

        let mut validators = HashMap::with_capacity(field_types.len());
        for field_type in &field_types {
            validators.insert(field_type.field_type_id()?, self.validators.create(field_type)?);
        }
        if let Some(missing) = ids.iter().find(|id| !validators.contains_key(*id)) {
            return Err(DomainError::not_found(FieldType::aggregate_type(), missing));
        }
        Ok(validators)
    }

    /// Checks the unique name and field values of one locale.
    async fn check_locale(
        &self,
        content: &Content,
        content_type: &ContentType,
        key: Option<LanguageId>,
        validators: &Validators,
    ) -> Result<(), DomainError> {
        let content_id = content.content_id()?;
        let content_type_id = content_type.content_type_id()?;
        let Some(locale) = content.find_locale(key) else {
            return Ok(());
        };

        let unique_name = locale.unique_name();
        if let Some(existing) = self
            .querier
            .find_id(content_type_id, key, unique_name)
            .await?
            && existing != content_id
        {
            record_conflict(Content::aggregate_type(), "read_model");
            return Err(ConflictError::ContentUniqueNameAlreadyUsed {
                content_id,
                content_type_id,
                language_id: key,
                unique_name: unique_name.clone(),
                conflicting_id: existing,
            }
            .into());
        }

        self.check_field_values(
            content_id,
            content_type,
            key,
            locale,
            content.is_published(key),
            validators,
        )
        .await
    }

    async fn check_field_values(
        &self,
        content_id: ContentId,
        content_type: &ContentType,
        key: Option<LanguageId>,
        locale: &ContentLocale,
        is_published: bool,
        validators: &Validators,
    ) -> Result<(), DomainError> {
        let content_type_id = content_type.content_type_id()?;
        let definitions: HashMap<FieldId, &FieldDefinition> = in_scope(content_type, key)
            .map(|definition| (definition.id, definition))
            .collect();

        let unexpected: Vec<_> = locale
            .field_values()
            .iter()
            .filter(|(field_id, _)| !definitions.contains_key(field_id))
            .map(|(field_id, value)| {
                ValidationFailure::new(
                    codes::UNEXPECTED_FIELD,
                    "The field is not expected in this locale.",
                    field_id.to_string(),
                )
                .with_value(value.clone())
                .with_field_id(*field_id)
            })
            .collect();
        if !unexpected.is_empty() {
            return Err(ValidationError::new(unexpected).into());
        }

        let mut missing: Vec<&FieldDefinition> = in_scope(content_type, key)
            .filter(|definition| definition.is_required)
            .collect();
        let mut failures = Vec::new();
        let mut staged = BTreeMap::new();
        for (field_id, value) in locale.field_values() {
            let Some(definition) = definitions.get(field_id) else {
                continue;
            };
            missing.retain(|required| required.id != *field_id);

            let validator = validators.get(&definition.field_type_id).ok_or_else(|| {
                DomainError::not_found(FieldType::aggregate_type(), definition.field_type_id)
            })?;
            let value_failures = validator
                .validate(value, definition.unique_name.as_str())
                .await?;
            if value_failures.is_empty() {
                if definition.is_unique {
                    staged.insert(*field_id, value.clone());
                }
            } else {
                failures.extend(
                    value_failures
                        .into_iter()
                        .map(|failure| failure.with_field_id(*field_id)),
                );
            }
        }

        if is_published && !missing.is_empty() {
            let required = missing
                .into_iter()
                .map(|definition| {
                    ValidationFailure::new(
                        codes::REQUIRED_FIELD,
                        "The field is required to publish.",
                        definition.unique_name.as_str(),
                    )
                    .with_field_id(definition.id)
                })
                .collect();
            return Err(ValidationError::new(required).into());
        }
        if !failures.is_empty() {
            return Err(ValidationError::new(failures).into());
        }

        if !staged.is_empty() {
            let conflicts = self
                .querier
                .find_conflicts(content_type_id, key, &staged, content_id)
                .await?;
            if !conflicts.is_empty() {
                record_conflict(Content::aggregate_type(), "read_model");
                return Err(ConflictError::ContentFieldValueConflict {
                    content_id,
                    content_type_id,
                    language_id: key,
                    conflicts,
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Claims of a content save, with the scope of every claimed locale.
struct LocaleClaims {
    set: ClaimSet,
    scopes: Vec<(String, Option<LanguageId>)>,
}

/// Definitions whose values live in the locale: invariant fields in the
/// invariant locale, variant fields in language locales.
fn in_scope(
    content_type: &ContentType,
    key: Option<LanguageId>,
) -> impl Iterator<Item = &FieldDefinition> {
    content_type
        .fields()
        .iter()
        .filter(move |definition| definition.is_invariant == key.is_none())
}

fn unique_values(
    content_type: &ContentType,
    key: Option<LanguageId>,
    locale: &ContentLocale,
) -> Vec<(FieldId, String)> {
    in_scope(content_type, key)
        .filter(|definition| definition.is_unique)
        .filter_map(|definition| {
            locale
                .field_value(definition.id)
                .map(|value| (definition.id, value.to_string()))
        })
        .collect()
}

/// Turns a claim violation into the conflict the read-model check reports.
fn into_content_conflict(
    error: DomainError,
    content: &Content,
    content_type_id: ContentTypeId,
    scopes: &[(String, Option<LanguageId>)],
) -> DomainError {
    let DomainError::EventStore(EventStoreError::UniqueConstraintViolation {
        scope, key, owner, ..
    }) = &error
    else {
        return error;
    };
    let (Ok(content_id), Some((_, language_id))) =
        (content.content_id(), scopes.iter().find(|(s, _)| s == scope))
    else {
        return error;
    };
    let language_id = *language_id;
    let conflicting_id = ContentId::from_aggregate_id(*owner);

    let conflict = if key == UNIQUE_NAME_KEY {
        let Some(locale) = content.find_locale(language_id) else {
            return error;
        };
        ConflictError::ContentUniqueNameAlreadyUsed {
            content_id,
            content_type_id,
            language_id,
            unique_name: locale.unique_name().clone(),
            conflicting_id,
        }
    } else if let Some(field_id) = parse_field_key(key) {
        ConflictError::ContentFieldValueConflict {
            content_id,
            content_type_id,
            language_id,
            conflicts: BTreeMap::from([(field_id, conflicting_id)]),
        }
    } else {
        return error;
    };

    tracing::info!(%conflicting_id, "unique claim rejected the content");
    record_conflict(Content::aggregate_type(), "storage");
    conflict.into()
}
