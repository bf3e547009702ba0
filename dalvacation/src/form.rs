use std::collections::BTreeMap;

/// A form field as typed by the user, with the outcome of its last validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Value<T> {
    pub value: T,
    pub warning: Option<String>,
    pub valid: bool,
}

impl std::default::Default for Value<String> {
    fn default() -> Self {
        Self {
            value: "".to_string(),
            warning: None,
            valid: true,
        }
    }
}

impl<T> Value<T> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            warning: None,
            valid: true,
        }
    }

    pub fn set(&mut self, value: T) {
        self.value = value;
        self.warning = None;
        self.valid = true;
    }

    pub fn invalidate(&mut self, warning: impl Into<String>) {
        self.warning = Some(warning.into());
        self.valid = false;
    }
}

/// Human-readable validation messages keyed by the field they belong to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Errors<F: Ord>(BTreeMap<F, String>);

impl<F: Ord> Default for Errors<F> {
    fn default() -> Self {
        Self(BTreeMap::new())
    }
}

impl<F: Ord + Copy> Errors<F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keeps the first message reported for a field.
    pub fn insert(&mut self, field: F, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn get(&self, field: F) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    pub fn contains(&self, field: F) -> bool {
        self.0.contains_key(&field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (F, &str)> {
        self.0.iter().map(|(f, m)| (*f, m.as_str()))
    }

    /// Returns `ok` if no error was collected.
    pub fn into_result<T>(self, ok: impl FnOnce() -> T) -> Result<T, Self> {
        if self.0.is_empty() {
            Ok(ok())
        } else {
            Err(self)
        }
    }
}

impl<F: Ord + std::fmt::Display> std::fmt::Display for Errors<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        for (i, (field, message)) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", field, message)?;
        }
        Ok(())
    }
}
