use crate::annotations::Annotation;

pub const RUNTIME_VISIBLE_ANNOTATIONS: &str = "RuntimeVisibleAnnotations";
pub const RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS: &str = "RuntimeVisibleParameterAnnotations";

/// The attribute names this crate decodes; everything else is skipped.
pub const KNOWN_ATTRIBUTE_NAMES: [&str; 2] = [
    RUNTIME_VISIBLE_ANNOTATIONS,
    RUNTIME_VISIBLE_PARAMETER_ANNOTATIONS,
];

/// One class-level attribute record.
///
/// Only the annotation-bearing attributes are decoded; every other attribute
/// becomes `Unknown`, its payload already advanced over byte-for-byte. Both
/// forms consume exactly 6 + length bytes from the stream, which is what
/// keeps the cursor aligned for the record that follows.
#[derive(Debug, PartialEq, Clone)]
pub enum Attribute {
    RuntimeVisibleAnnotations(Vec<Annotation>),
    /// One annotation list per declared parameter.
    RuntimeVisibleParameterAnnotations(Vec<Vec<Annotation>>),
    Unknown { length: u32 },
}

#[derive(Debug, Default, PartialEq, Clone)]
pub struct Attributes(pub Vec<Attribute>);

impl Attributes {
    pub fn iter(&self) -> std::slice::Iter<'_, Attribute> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// All annotations from every RuntimeVisibleAnnotations attribute, in
    /// encounter order.
    pub fn annotation_entries(&self) -> impl Iterator<Item = &Annotation> {
        self.0.iter().flat_map(|attribute| match attribute {
            Attribute::RuntimeVisibleAnnotations(annotations) => annotations.iter(),
            _ => [].iter(),
        })
    }
}

impl<'a> IntoIterator for &'a Attributes {
    type Item = &'a Attribute;
    type IntoIter = std::slice::Iter<'a, Attribute>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}
