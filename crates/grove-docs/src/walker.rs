//! Conversion of shape descriptors into schema nodes.

use std::collections::HashSet;

use grove_core::{ParamLocation, RecordDescriptor, TypeDescriptor};

use crate::openapi::{Components, Parameter, ParameterIn, Schema};

/// Walks [`TypeDescriptor`]s into [`Schema`] nodes.
///
/// Records are written into the borrowed components once and referenced by
/// name afterwards. Distinct types sharing a name get numbered keys
/// (`Item`, `Item_2`). Fields tagged with a location become [`Parameter`]s
/// instead of body properties.
///
/// # Example
///
/// ```
/// use grove_core::Shape;
/// use grove_docs::{Components, SchemaWalker};
///
/// let mut components = Components::default();
/// let mut params = Vec::new();
/// let schema = SchemaWalker::new(&mut components).walk(&Vec::<u8>::describe(), &mut params);
///
/// let items = schema.unwrap().items.unwrap();
/// assert_eq!(items.format.as_deref(), Some("uint8"));
/// assert_eq!(items.minimum, Some(0));
/// ```
#[derive(Debug)]
pub struct SchemaWalker<'a> {
    components: &'a mut Components,
    visiting: HashSet<String>,
}

impl<'a> SchemaWalker<'a> {
    /// Creates a walker writing into `components`.
    pub fn new(components: &'a mut Components) -> Self {
        Self {
            components,
            visiting: HashSet::new(),
        }
    }

    /// Walks `ty`, appending any location-tagged record fields to `params`.
    ///
    /// Returns `None` for shapes without a body: the unit type and records
    /// whose fields are all parameters.
    pub fn walk(&mut self, ty: &TypeDescriptor, params: &mut Vec<Parameter>) -> Option<Schema> {
        match ty {
            TypeDescriptor::Unit => None,
            TypeDescriptor::Bool => Some(Schema::boolean()),
            TypeDescriptor::String => Some(Schema::string()),
            TypeDescriptor::Integer { format, unsigned } => {
                let mut schema = Schema::integer();
                schema.format = format.map(ToString::to_string);
                if *unsigned {
                    schema.minimum = Some(0);
                }
                Some(schema)
            }
            TypeDescriptor::Number { format } => Some(Schema::number().with_format(*format)),
            TypeDescriptor::Array { items, len } => {
                let mut schema = Schema::array(self.walk(&items(), params).unwrap_or_default());
                if let Some(len) = len {
                    let len = *len as u64;
                    schema.min_items = Some(len);
                    schema.max_items = Some(len);
                }
                Some(schema)
            }
            TypeDescriptor::Map { values } => {
                Some(Schema::map(self.walk(&values(), params).unwrap_or_default()))
            }
            TypeDescriptor::Dynamic => Some(Schema::any_object()),
            TypeDescriptor::Record(record) => self.walk_record(record, params),
        }
    }

    fn walk_record(
        &mut self,
        record: &RecordDescriptor,
        params: &mut Vec<Parameter>,
    ) -> Option<Schema> {
        let key = self.component_key(record);

        if self.visiting.contains(&key) {
            return Some(Schema::reference(&key));
        }
        if self.components.schemas.contains_key(&key) {
            // Body already emitted; parameters belong to each operation.
            self.collect_parameters(record, &key, params);
            return Some(Schema::reference(&key));
        }

        self.visiting.insert(key.clone());
        let mut object = Schema::object();
        for field in record.fields.iter().filter(|f| !f.skip) {
            let schema = self.walk(&(field.shape)(), params);
            if let Some(location) = field.location {
                params.push(parameter(location, schema));
            } else if let Some(property) = field.property_name() {
                object
                    .properties
                    .insert(property.to_string(), schema.unwrap_or_default());
            }
        }
        self.visiting.remove(&key);

        if object.properties.is_empty() {
            return None;
        }
        let reference = Schema::reference(&key);
        self.components.schemas.insert(key, object);
        Some(reference)
    }

    /// Resolves the component key owned by `record`'s type, claiming the
    /// first free `name`, `name_2`, ... on first sight.
    fn component_key(&mut self, record: &RecordDescriptor) -> String {
        let origin = record.type_path.as_deref().unwrap_or(&record.name);
        let mut key = record.name.clone();
        let mut n = 1;
        loop {
            match self.components.origins.get(&key) {
                Some(owner) if owner == origin => return key,
                Some(_) => {
                    n += 1;
                    key = format!("{}_{n}", record.name);
                }
                None => {
                    self.components
                        .origins
                        .insert(key.clone(), origin.to_string());
                    return key;
                }
            }
        }
    }

    /// Re-collects the parameters of an emitted record, descending into its
    /// fields the way the first walk did.
    fn collect_parameters(
        &mut self,
        record: &RecordDescriptor,
        key: &str,
        params: &mut Vec<Parameter>,
    ) {
        self.visiting.insert(key.to_string());
        for field in record.fields.iter().filter(|f| !f.skip) {
            let schema = self.walk(&(field.shape)(), params);
            if let Some(location) = field.location {
                params.push(parameter(location, schema));
            }
        }
        self.visiting.remove(key);
    }
}

fn parameter(location: ParamLocation, schema: Option<Schema>) -> Parameter {
    let (name, location, required, allow_empty_value) = match location {
        ParamLocation::Header(name) => (name, ParameterIn::Header, false, false),
        ParamLocation::Path(name) => (name, ParameterIn::Path, true, false),
        ParamLocation::Query(name) => (name, ParameterIn::Query, false, true),
    };
    Parameter {
        name: name.to_string(),
        location,
        description: None,
        required,
        allow_empty_value,
        schema,
    }
}
