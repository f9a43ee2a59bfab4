use std::collections::HashMap;

use crate::error::Result;

const STORE_CAPACITY: usize = 16;

/// Substitution values for a single response.
#[derive(Debug, Default, Clone)]
pub struct VariableStore {
    vars: Option<HashMap<String, String>>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `name -> value`, replacing any previous value for `name`.
    pub fn set(&mut self, name: &str, value: &str) -> Result<()> {
        let vars = self
            .vars
            .get_or_insert_with(|| HashMap::with_capacity(STORE_CAPACITY));

        if let Some(existing) = vars.get_mut(name) {
            existing.clear();
            existing.try_reserve(value.len())?;
            existing.push_str(value);
            return Ok(());
        }

        vars.try_reserve(1)?;
        vars.insert(name.to_string(), value.to_string());
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.as_ref()?.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.as_ref().map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
