use crate::errors::{DomainError, DomainResult, ValidationError};

/// A trait that entities should implement for validation.
pub trait Validate {
    /// Validates the entity and returns an error if validation fails.
    fn validate(&self) -> DomainResult<()>;
}

/// Struct for configuring validations in a fluent style
#[derive(Default)]
pub struct ValidationBuilder<T> {
    field_name: String,
    value: Option<T>,
    errors: Vec<ValidationError>,
}

/// Generic validation implementations
impl<T> ValidationBuilder<T> {
    pub fn new(field_name: &str, value: Option<T>) -> Self {
        Self {
            field_name: field_name.to_string(),
            value,
            errors: Vec::new(),
        }
    }

    pub fn validate_with<F>(mut self, validator: F) -> Self
    where F: FnOnce(&T) -> Result<(), ValidationError> {
        if let Some(value) = &self.value {
            if let Err(err) = validator(value) {
                self.errors.push(err);
            }
        }
        self
    }

    /// Complete validation and return result
    pub fn validate(self) -> DomainResult<()> {
        match self.errors.into_iter().next() {
            None => Ok(()),
            // Return the first error for simplicity
            Some(err) => Err(DomainError::Validation(err)),
        }
    }
}

/// String-specific validations
impl ValidationBuilder<String> {
    /// Fails when the value is absent or blank.
    pub fn required(mut self) -> Self {
        let blank = self.value.as_deref().map_or(true, |v| v.trim().is_empty());
        if blank {
            self.errors.push(ValidationError::required(&self.field_name));
        }
        self
    }

    /// Length is counted in characters, not bytes.
    pub fn max_length(mut self, max: usize) -> Self {
        if let Some(value) = &self.value {
            if value.chars().count() > max {
                self.errors.push(ValidationError::max_length(&self.field_name, max));
            }
        }
        self
    }
}

/// Numeric range check for any ordered value
impl<T: PartialOrd + std::fmt::Display + Copy> ValidationBuilder<T> {
    pub fn range(mut self, min: T, max: T) -> Self {
        if let Some(value) = self.value {
            if value < min || value > max {
                self.errors.push(ValidationError::range(&self.field_name, min, max));
            }
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_required_rejects_blank() {
        let result = ValidationBuilder::new("label", Some("   ".to_string()))
            .required()
            .validate();
        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::Required { .. }))
        ));

        let result = ValidationBuilder::<String>::new("label", None).required().validate();
        assert!(result.is_err());

        assert!(ValidationBuilder::new("label", Some("Anonymous".to_string()))
            .required()
            .validate()
            .is_ok());
    }

    #[test]
    fn test_max_length_counts_chars() {
        // Four characters, eight bytes
        let value = "éééé".to_string();
        assert!(ValidationBuilder::new("text", Some(value.clone()))
            .max_length(4)
            .validate()
            .is_ok());
        assert!(ValidationBuilder::new("text", Some(value))
            .max_length(3)
            .validate()
            .is_err());
    }

    #[test]
    fn test_range_and_custom_validator() {
        assert!(ValidationBuilder::new("offset", Some(3600)).range(-64800, 64800).validate().is_ok());
        assert!(ValidationBuilder::new("offset", Some(90000)).range(-64800, 64800).validate().is_err());

        let result = ValidationBuilder::new("category", Some("All".to_string()))
            .validate_with(|v| {
                if v.contains(',') {
                    Err(ValidationError::format("category", "commas are not allowed"))
                } else {
                    Ok(())
                }
            })
            .validate();
        assert!(result.is_ok());
    }
}
