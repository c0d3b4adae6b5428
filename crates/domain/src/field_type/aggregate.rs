//! Field type aggregate implementation.

use common::AggregateId;
use event_store::Version;

use crate::aggregate::Aggregate;
use crate::value_objects::{Description, DisplayName, FieldTypeId, UniqueName};

use super::{DataType, FieldTypeError, FieldTypeEvent, FieldTypeProperties};

/// Field type aggregate root.
///
/// A reusable, typed field kind. Its data type is fixed at creation by the
/// variant of its properties.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FieldType {
    id: Option<FieldTypeId>,
    version: Version,
    unique_name: Option<UniqueName>,
    display_name: Option<DisplayName>,
    description: Option<Description>,
    properties: Option<FieldTypeProperties>,
    is_deleted: bool,
    changes: Vec<FieldTypeEvent>,
}

impl Aggregate for FieldType {
    type Event = FieldTypeEvent;

    fn aggregate_type() -> &'static str {
        "FieldType"
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
            FieldTypeEvent::FieldTypeCreated(data) => {
                self.id = Some(data.field_type_id);
                self.unique_name = Some(data.unique_name);
                self.properties = Some(data.properties);
            }
            FieldTypeEvent::FieldTypeUniqueNameChanged(data) => {
                self.unique_name = Some(data.unique_name)
            }
            FieldTypeEvent::FieldTypeDisplayNameChanged(data) => {
                self.display_name = data.display_name
            }
            FieldTypeEvent::FieldTypeDescriptionChanged(data) => {
                self.description = data.description
            }
            FieldTypeEvent::FieldTypePropertiesChanged(data) => {
                self.properties = Some(data.properties)
            }
            FieldTypeEvent::FieldTypeDeleted(_) => self.is_deleted = true,
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
impl FieldType {
    pub fn field_type_id(&self) -> Result<FieldTypeId, FieldTypeError> {
        self.id.ok_or(FieldTypeError::NotCreated)
    }

    pub fn unique_name(&self) -> Result<&UniqueName, FieldTypeError> {
        self.unique_name.as_ref().ok_or(FieldTypeError::NotCreated)
    }

    pub fn display_name(&self) -> Option<&DisplayName> {
        self.display_name.as_ref()
    }

    pub fn description(&self) -> Option<&Description> {
        self.description.as_ref()
    }

    pub fn properties(&self) -> Result<&FieldTypeProperties, FieldTypeError> {
        self.properties.as_ref().ok_or(FieldTypeError::NotCreated)
    }

    pub fn data_type(&self) -> Result<DataType, FieldTypeError> {
        self.properties().map(FieldTypeProperties::data_type)
    }
}

// Command methods
impl FieldType {
    /// Creates a new field type.
    ///
    /// Name uniqueness inside the realm is checked on save, not here.
    pub fn new(
        id: FieldTypeId,
        unique_name: UniqueName,
        properties: FieldTypeProperties,
    ) -> Result<Self, FieldTypeError> {
        properties.validate()?;

        let mut field_type = Self::default();
        field_type.raise(FieldTypeEvent::created(id, unique_name, properties));
        Ok(field_type)
    }

    pub fn set_unique_name(&mut self, unique_name: UniqueName) -> Result<(), FieldTypeError> {
        self.ensure_active()?;
        if self.unique_name.as_ref() != Some(&unique_name) {
            self.raise(FieldTypeEvent::unique_name_changed(unique_name));
        }
        Ok(())
    }

    pub fn set_display_name(
        &mut self,
        display_name: Option<DisplayName>,
    ) -> Result<(), FieldTypeError> {
        self.ensure_active()?;
        if self.display_name != display_name {
            self.raise(FieldTypeEvent::display_name_changed(display_name));
        }
        Ok(())
    }

    pub fn set_description(
        &mut self,
        description: Option<Description>,
    ) -> Result<(), FieldTypeError> {
        self.ensure_active()?;
        if self.description != description {
            self.raise(FieldTypeEvent::description_changed(description));
        }
        Ok(())
    }

    /// Replaces the properties; their data type must stay the same.
    pub fn set_properties(&mut self, properties: FieldTypeProperties) -> Result<(), FieldTypeError> {
        self.ensure_active()?;
        let expected = self.data_type()?;
        if properties.data_type() != expected {
            return Err(FieldTypeError::PropertiesMismatch {
                expected,
                actual: properties.data_type(),
            });
        }
        properties.validate()?;

        if self.properties.as_ref() != Some(&properties) {
            self.raise(FieldTypeEvent::properties_changed(properties));
        }
        Ok(())
    }

    /// Soft-deletes the field type. Deleting twice raises nothing.
    pub fn delete(&mut self) -> Result<(), FieldTypeError> {
        self.field_type_id()?;
        if !self.is_deleted {
            self.raise(FieldTypeEvent::deleted());
        }
        Ok(())
    }

    fn ensure_active(&self) -> Result<(), FieldTypeError> {
        self.field_type_id()?;
        if self.is_deleted {
            return Err(FieldTypeError::Deleted);
        }
        Ok(())
    }

    fn raise(&mut self, event: FieldTypeEvent) {
        self.apply(event.clone());
        self.changes.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field_type::{NumberProperties, StringProperties};

    fn string_field_type() -> FieldType {
        FieldType::new(
            FieldTypeId::new(None),
            UniqueName::new("Slug").unwrap(),
            FieldTypeProperties::String(StringProperties {
                min_length: Some(1),
                max_length: Some(100),
                pattern: None,
            }),
        )
        .unwrap()
    }

    #[test]
    fn create_raises_one_event() {
        let field_type = string_field_type();
        assert_eq!(field_type.pending_events().len(), 1);
        assert_eq!(field_type.data_type().unwrap(), DataType::String);
        assert_eq!(field_type.unique_name().unwrap().as_str(), "Slug");
    }

    #[test]
    fn create_rejects_invalid_properties() {
        let result = FieldType::new(
            FieldTypeId::new(None),
            UniqueName::new("Price").unwrap(),
            FieldTypeProperties::Number(NumberProperties {
                min_value: Some(10.0),
                max_value: Some(0.0),
                step: None,
            }),
        );
        assert!(matches!(result, Err(FieldTypeError::InvalidProperties(_))));
    }

    #[test]
    fn set_properties_with_other_data_type_fails() {
        let mut field_type = string_field_type();
        let result =
            field_type.set_properties(FieldTypeProperties::Number(NumberProperties::default()));

        assert!(matches!(
            result,
            Err(FieldTypeError::PropertiesMismatch {
                expected: DataType::String,
                actual: DataType::Number
            })
        ));
        assert_eq!(field_type.pending_events().len(), 1);
    }

    #[test]
    fn unchanged_values_raise_nothing() {
        let mut field_type = string_field_type();
        field_type.take_pending_events();

        field_type
            .set_unique_name(UniqueName::new("Slug").unwrap())
            .unwrap();
        field_type.set_display_name(None).unwrap();
        let same = field_type.properties().unwrap().clone();
        field_type.set_properties(same).unwrap();

        assert!(!field_type.has_changes());
    }

    #[test]
    fn set_properties_raises_when_changed() {
        let mut field_type = string_field_type();
        field_type.take_pending_events();

        field_type
            .set_properties(FieldTypeProperties::String(StringProperties {
                pattern: Some("^[a-z-]+$".to_string()),
                ..Default::default()
            }))
            .unwrap();

        assert_eq!(field_type.pending_events().len(), 1);
    }

    #[test]
    fn delete_is_idempotent_and_blocks_changes() {
        let mut field_type = string_field_type();
        field_type.delete().unwrap();
        field_type.delete().unwrap();

        assert!(field_type.is_deleted());
        assert_eq!(field_type.pending_events().len(), 2);
        assert!(matches!(
            field_type.set_display_name(None),
            Err(FieldTypeError::Deleted)
        ));
    }

    #[test]
    fn reading_before_creation_is_an_error() {
        let field_type = FieldType::default();
        assert!(matches!(
            field_type.unique_name(),
            Err(FieldTypeError::NotCreated)
        ));
    }
}
