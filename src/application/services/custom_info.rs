//! Custom key/value info attached to a system

use std::sync::Arc;

use tracing::instrument;

use crate::application::ApplicationResult;
use crate::domain::{CustomInfo, System};
use crate::infrastructure::traits::ServerApi;

pub struct CustomInfoService {
    api: Arc<dyn ServerApi>,
}

impl CustomInfoService {
    pub fn new(api: Arc<dyn ServerApi>) -> Self {
        Self { api }
    }

    /// All entries, or only `keyname` when given.
    pub fn view(&self, system: &System, keyname: Option<&str>) -> ApplicationResult<CustomInfo> {
        Ok(self.api.custom_info(&system.custom_info_key(), keyname)?)
    }

    /// Returns whether the server now holds `value` under `keyname`.
    #[instrument(skip(self, system), fields(system = %system.uuid))]
    pub fn add(&self, system: &System, keyname: &str, value: &str) -> ApplicationResult<bool> {
        let info = self
            .api
            .add_custom_info(&system.custom_info_key(), keyname, value)?;
        Ok(holds(&info, keyname, value))
    }

    /// Returns whether the server now holds `new` under `keyname`.
    #[instrument(skip(self, system), fields(system = %system.uuid))]
    pub fn update(
        &self,
        system: &System,
        keyname: &str,
        current: &str,
        new: &str,
    ) -> ApplicationResult<bool> {
        let info = self
            .api
            .update_custom_info(&system.custom_info_key(), keyname, current, new)?;
        Ok(holds(&info, keyname, new))
    }

    #[instrument(skip(self, system), fields(system = %system.uuid))]
    pub fn remove(
        &self,
        system: &System,
        keyname: &str,
        value: Option<&str>,
    ) -> ApplicationResult<bool> {
        Ok(self
            .api
            .remove_custom_info(&system.custom_info_key(), keyname, value)?)
    }
}

fn holds(info: &CustomInfo, keyname: &str, value: &str) -> bool {
    info.get(keyname)
        .is_some_and(|values| values.iter().any(|v| v == value))
}
