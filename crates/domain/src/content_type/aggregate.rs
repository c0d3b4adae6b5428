//! Content type aggregate implementation.

use common::AggregateId;
use event_store::Version;

use crate::aggregate::Aggregate;
use crate::value_objects::{ContentTypeId, Description, DisplayName, FieldId, FieldTypeId, UniqueName};

use super::{ContentTypeError, ContentTypeEvent, FieldDefinition};

/// Content type aggregate root.
///
/// A named schema: an ordered list of field definitions contents are
/// validated against. Field unique names are unique inside the content type,
/// and an invariant content type only holds invariant fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContentType {
    id: Option<ContentTypeId>,
    version: Version,
    unique_name: Option<UniqueName>,
    is_invariant: bool,
    display_name: Option<DisplayName>,
    description: Option<Description>,
    fields: Vec<FieldDefinition>,
    is_deleted: bool,
    changes: Vec<ContentTypeEvent>,
}

impl Aggregate for ContentType {
    type Event = ContentTypeEvent;

    fn aggregate_type() -> &'static str {
        "ContentType"
    }

    fn id(&self) -> Option<AggregateId> {
        self.id.map(|id| id.aggregate_id())
    }

    fn version(&self) -> Version {
        self.version
    }

    fn set_version(&mut self, version: Version) {
        self.version = version;
    }

    fn is_deleted(&self) -> bool {
        self.is_deleted
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            ContentTypeEvent::ContentTypeCreated(data) => {
                self.id = Some(data.content_type_id);
                self.unique_name = Some(data.unique_name);
                self.is_invariant = data.is_invariant;
            }
            ContentTypeEvent::ContentTypeUniqueNameChanged(data) => {
                self.unique_name = Some(data.unique_name);
            }
            ContentTypeEvent::ContentTypeDisplayNameChanged(data) => {
                self.display_name = data.display_name;
            }
            ContentTypeEvent::ContentTypeDescriptionChanged(data) => {
                self.description = data.description;
            }
            ContentTypeEvent::ContentTypeInvariantChanged(data) => {
                self.is_invariant = data.is_invariant;
            }
            ContentTypeEvent::FieldDefinitionChanged(data) => {
                self.apply_field_definition_changed(data.field_definition)
            }
            ContentTypeEvent::FieldDefinitionRemoved(data) => {
                self.fields.retain(|field| field.id != data.field_id);
            }
            ContentTypeEvent::ContentTypeDeleted(_) => self.is_deleted = true,
        }
    }

    fn pending_events(&self) -> &[Self::Event] {
        &self.changes
    }

    fn take_pending_events(&mut self) -> Vec<Self::Event> {
        std::mem::take(&mut self.changes)
    }
}

// Query methods
impl ContentType {
    pub fn content_type_id(&self) -> Result<ContentTypeId, ContentTypeError> {
        self.id.ok_or(ContentTypeError::NotCreated)
    }

    pub fn unique_name(&self) -> Result<&UniqueName, ContentTypeError> {
        self.unique_name
            .as_ref()
            .ok_or(ContentTypeError::NotCreated)
    }

    pub fn is_invariant(&self) -> bool {
        self.is_invariant
    }

    pub fn display_name(&self) -> Option<&DisplayName> {
        self.display_name.as_ref()
    }

    pub fn description(&self) -> Option<&Description> {
        self.description.as_ref()
    }

    /// Returns the field definitions in their declaration order.
    pub fn fields(&self) -> &[FieldDefinition] {
        &self.fields
    }

    pub fn find_field(&self, field_id: FieldId) -> Option<&FieldDefinition> {
        self.fields.iter().find(|field| field.id == field_id)
    }

    pub fn find_field_by_name(&self, unique_name: &UniqueName) -> Option<&FieldDefinition> {
        self.fields
            .iter()
            .find(|field| field.unique_name.matches(unique_name))
    }

    /// Returns the definitions bound to a field type.
    pub fn fields_of_type(
        &self,
        field_type_id: FieldTypeId,
    ) -> impl Iterator<Item = &FieldDefinition> {
        self.fields
            .iter()
            .filter(move |field| field.field_type_id == field_type_id)
    }

    pub fn references_field_type(&self, field_type_id: FieldTypeId) -> bool {
        self.fields_of_type(field_type_id).next().is_some()
    }
}

// Command methods
impl ContentType {
    /// Creates a new content type.
    ///
    /// Name uniqueness inside the realm is checked on save, not here.
    pub fn new(id: ContentTypeId, unique_name: UniqueName, is_invariant: bool) -> Self {
        let mut content_type = Self::default();
        content_type.raise(ContentTypeEvent::created(id, unique_name, is_invariant));
        content_type
    }

    pub fn set_unique_name(&mut self, unique_name: UniqueName) -> Result<(), ContentTypeError> {
        self.ensure_active()?;
        if self.unique_name.as_ref() != Some(&unique_name) {
            self.raise(ContentTypeEvent::unique_name_changed(unique_name));
        }
        Ok(())
    }

    pub fn set_display_name(
        &mut self,
        display_name: Option<DisplayName>,
    ) -> Result<(), ContentTypeError> {
        self.ensure_active()?;
        if self.display_name != display_name {
            self.raise(ContentTypeEvent::display_name_changed(display_name));
        }
        Ok(())
    }

    pub fn set_description(
        &mut self,
        description: Option<Description>,
    ) -> Result<(), ContentTypeError> {
        self.ensure_active()?;
        if self.description != description {
            self.raise(ContentTypeEvent::description_changed(description));
        }
        Ok(())
    }

    /// Changes the invariant flag.
    ///
    /// A content type holding variant fields cannot become invariant.
    pub fn set_is_invariant(&mut self, is_invariant: bool) -> Result<(), ContentTypeError> {
        self.ensure_active()?;
        if is_invariant {
            let field_ids: Vec<_> = self
                .fields
                .iter()
                .filter(|field| !field.is_invariant)
                .map(|field| field.id)
                .collect();
            if !field_ids.is_empty() {
                return Err(ContentTypeError::HasVariantFields { field_ids });
            }
        }
        if self.is_invariant != is_invariant {
            self.raise(ContentTypeEvent::invariant_changed(is_invariant));
        }
        Ok(())
    }

    /// Adds a field definition, or replaces the one with the same id in place.
    pub fn set_field(&mut self, definition: FieldDefinition) -> Result<(), ContentTypeError> {
        self.ensure_active()?;

        if self.is_invariant && !definition.is_invariant {
            return Err(ContentTypeError::VariantFieldOnInvariantType {
                field_id: definition.id,
            });
        }

        if let Some(other) = self
            .find_field_by_name(&definition.unique_name)
            .filter(|other| other.id != definition.id)
        {
            return Err(ContentTypeError::FieldNameConflict {
                content_type_id: self.content_type_id()?,
                unique_name: definition.unique_name.clone(),
                field_id: definition.id,
                conflicting_field_id: other.id,
            });
        }

        if self.find_field(definition.id) != Some(&definition) {
            self.raise(ContentTypeEvent::field_definition_changed(definition));
        }
        Ok(())
    }

    /// Removes a field definition. Returns false if there was none.
    pub fn remove_field(&mut self, field_id: FieldId) -> Result<bool, ContentTypeError> {
        self.ensure_active()?;
        if self.find_field(field_id).is_none() {
            return Ok(false);
        }
        self.raise(ContentTypeEvent::field_definition_removed(field_id));
        Ok(true)
    }

    /// Soft-deletes the content type. Deleting twice raises nothing.
    pub fn delete(&mut self) -> Result<(), ContentTypeError> {
        self.content_type_id()?;
        if !self.is_deleted {
            self.raise(ContentTypeEvent::deleted());
        }
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), ContentTypeError> {
        self.content_type_id()?;
        if self.is_deleted {
            return Err(ContentTypeError::Deleted);
        }
        Ok(())
    }

    fn raise(&mut self, event: ContentTypeEvent) {
        self.apply(event.clone());
        self.changes.push(event);
    }
}

// Apply event helpers
impl ContentType {
    fn apply_field_definition_changed(&mut self, definition: FieldDefinition) {
        match self.fields.iter_mut().find(|field| field.id == definition.id) {
            Some(existing) => *existing = definition,
            None => self.fields.push(definition),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blog_article(is_invariant: bool) -> ContentType {
        let mut content_type = ContentType::new(
            ContentTypeId::new(None),
            UniqueName::new("BlogArticle").unwrap(),
            is_invariant,
        );
        content_type.take_pending_events();
        content_type
    }

    fn definition(name: &str) -> FieldDefinition {
        FieldDefinition::new(
            FieldId::new(),
            FieldTypeId::new(None),
            UniqueName::new(name).unwrap(),
        )
    }

    #[test]
    fn set_field_appends_then_updates_in_place() {
        let mut content_type = blog_article(false);
        let title = definition("Title");
        let slug = definition("Slug").invariant(true);

        content_type.set_field(title.clone()).unwrap();
        content_type.set_field(slug.clone()).unwrap();
        content_type
            .set_field(title.clone().required(true))
            .unwrap();

        let fields = content_type.fields();
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].id, title.id);
        assert!(fields[0].is_required);
        assert_eq!(fields[1].id, slug.id);
        assert_eq!(content_type.pending_events().len(), 3);
    }

    #[test]
    fn set_field_with_equal_definition_raises_nothing() {
        let mut content_type = blog_article(false);
        let title = definition("Title");
        content_type.set_field(title.clone()).unwrap();
        content_type.take_pending_events();

        content_type.set_field(title).unwrap();
        assert!(!content_type.has_changes());
    }

    #[test]
    fn field_names_are_unique_ignoring_case() {
        let mut content_type = blog_article(false);
        let first = definition("Slug");
        content_type.set_field(first.clone()).unwrap();

        let result = content_type.set_field(definition("SLUG"));
        match result {
            Err(ContentTypeError::FieldNameConflict {
                conflicting_field_id,
                ..
            }) => assert_eq!(conflicting_field_id, first.id),
            other => panic!("expected a name conflict, got {other:?}"),
        }
    }

    #[test]
    fn invariant_content_type_rejects_variant_fields_first() {
        let mut content_type = blog_article(true);
        let slug = definition("Slug").invariant(true);
        content_type.set_field(slug).unwrap();

        // Same name as an existing field, but the invariant rule wins.
        let result = content_type.set_field(definition("Slug").required(true).unique(true));
        assert!(matches!(
            result,
            Err(ContentTypeError::VariantFieldOnInvariantType { .. })
        ));
    }

    #[test]
    fn cannot_become_invariant_with_variant_fields() {
        let mut content_type = blog_article(false);
        let title = definition("Title");
        content_type.set_field(title.clone()).unwrap();

        match content_type.set_is_invariant(true) {
            Err(ContentTypeError::HasVariantFields { field_ids }) => {
                assert_eq!(field_ids, vec![title.id])
            }
            other => panic!("expected variant fields error, got {other:?}"),
        }

        content_type.set_field(title.invariant(true)).unwrap();
        content_type.set_is_invariant(true).unwrap();
        assert!(content_type.is_invariant());
    }

    #[test]
    fn remove_field_is_idempotent() {
        let mut content_type = blog_article(false);
        let title = definition("Title");
        content_type.set_field(title.clone()).unwrap();

        assert!(content_type.remove_field(title.id).unwrap());
        assert!(!content_type.remove_field(title.id).unwrap());
        assert!(content_type.fields().is_empty());
    }

    #[test]
    fn fields_of_type_filters_by_field_type() {
        let mut content_type = blog_article(false);
        let field_type_id = FieldTypeId::new(None);
        let a = FieldDefinition::new(FieldId::new(), field_type_id, UniqueName::new("A").unwrap());
        let b = FieldDefinition::new(FieldId::new(), field_type_id, UniqueName::new("B").unwrap());
        content_type.set_field(a).unwrap();
        content_type.set_field(b).unwrap();
        content_type.set_field(definition("C")).unwrap();

        assert_eq!(content_type.fields_of_type(field_type_id).count(), 2);
        assert!(content_type.references_field_type(field_type_id));
        assert!(!content_type.references_field_type(FieldTypeId::new(None)));
    }
}
