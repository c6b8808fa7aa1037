//! The signed-in user's saved delivery addresses.

use std::sync::Arc;

use paratha_core::AddressId;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use crate::api::{
    AddressApi, AddressKind, ApiAddress, ApiError, CreateAddressRequest, UpdateAddressRequest,
};
use crate::validation::{ValidationError, validate_required};

/// Errors from address book operations.
#[derive(Debug, Error)]
pub enum AddressError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// A saved address.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    pub kind: AddressKind,
    /// Street line.
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_default: bool,
}

impl From<ApiAddress> for Address {
    fn from(address: ApiAddress) -> Self {
        Self {
            id: address.id,
            kind: address.label,
            address: address.street,
            city: address.city,
            state: address.state,
            zip_code: address.zip_code,
            latitude: address.latitude,
            longitude: address.longitude,
            is_default: address.is_default,
        }
    }
}

/// A new address.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressDraft {
    pub kind: AddressKind,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_default: bool,
}

impl AddressDraft {
    /// # Errors
    ///
    /// Returns the first missing required field.
    pub fn validate(&self) -> Result<(), ValidationError> {
        validate_required(&self.city, "City")?;
        validate_required(&self.state, "State")?;
        validate_required(&self.zip_code, "ZIP code")
    }

    fn into_request(self) -> CreateAddressRequest {
        CreateAddressRequest {
            label: self.kind,
            street: self.address,
            city: self.city,
            state: self.state,
            zip: self.zip_code.clone(),
            zip_code: self.zip_code,
            latitude: self.latitude.unwrap_or_default(),
            longitude: self.longitude.unwrap_or_default(),
            is_default: self.is_default,
        }
    }
}

/// Changes to a saved address. `None` fields are left as they are.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AddressPatch {
    pub kind: Option<AddressKind>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_default: Option<bool>,
}

impl From<AddressPatch> for UpdateAddressRequest {
    fn from(patch: AddressPatch) -> Self {
        Self {
            label: patch.kind,
            street: patch.address,
            city: patch.city,
            state: patch.state,
            zip: patch.zip_code.clone(),
            zip_code: patch.zip_code,
            latitude: patch.latitude,
            longitude: patch.longitude,
            is_default: patch.is_default,
        }
    }
}

/// Local copy of the user's addresses, kept in sync with the server.
///
/// Every operation clears `error` when it starts and sets it on failure.
pub struct AddressBook {
    api: Arc<dyn AddressApi>,
    addresses: Vec<Address>,
    error: Option<String>,
}

impl std::fmt::Debug for AddressBook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressBook")
            .field("addresses", &self.addresses)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

impl AddressBook {
    #[must_use]
    pub fn new(api: Arc<dyn AddressApi>) -> Self {
        Self {
            api,
            addresses: Vec::new(),
            error: None,
        }
    }

    #[must_use]
    pub fn addresses(&self) -> &[Address] {
        &self.addresses
    }

    /// Last failure message.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// The address marked as default.
    #[must_use]
    pub fn default_address(&self) -> Option<&Address> {
        self.addresses.iter().find(|a| a.is_default)
    }

    pub fn clear_error(&mut self) {
        self.error = None;
    }

    /// Forget all addresses, e.g. on logout.
    pub fn reset(&mut self) {
        self.addresses.clear();
        self.error = None;
    }

    /// Replace the local list with the server's.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Api` if the request fails.
    #[instrument(skip_all)]
    pub async fn load(&mut self, token: &SecretString) -> Result<&[Address], AddressError> {
        self.error = None;
        match self.api.list_addresses(token).await {
            Ok(addresses) => {
                self.addresses = addresses.into_iter().map(Address::from).collect();
                tracing::debug!(count = self.addresses.len(), "Loaded addresses");
                Ok(&self.addresses)
            }
            Err(e) => Err(self.fail(e.into(), "Failed to load addresses")),
        }
    }

    /// Save a new address.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for missing fields, `Api` if the request fails.
    #[instrument(skip_all)]
    pub async fn add(
        &mut self,
        token: &SecretString,
        draft: AddressDraft,
    ) -> Result<Address, AddressError> {
        self.error = None;
        if let Err(e) = draft.validate() {
            return Err(self.fail(e.into(), "Failed to add address"));
        }

        match self.api.create_address(token, &draft.into_request()).await {
            Ok(created) => {
                let created = Address::from(created);
                if created.is_default {
                    self.mark_default(&created.id);
                }
                tracing::info!(address_id = %created.id, "Address added");
                self.addresses.push(created.clone());
                Ok(created)
            }
            Err(e) => Err(self.fail(e.into(), "Failed to add address")),
        }
    }

    /// Change a saved address.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Api` if the request fails.
    #[instrument(skip_all, fields(address_id = %id))]
    pub async fn update(
        &mut self,
        token: &SecretString,
        id: &AddressId,
        patch: AddressPatch,
    ) -> Result<Address, AddressError> {
        self.error = None;
        let request = UpdateAddressRequest::from(patch);
        match self.api.update_address(token, id, &request).await {
            Ok(updated) => {
                let updated = Address::from(updated);
                if updated.is_default {
                    self.mark_default(id);
                }
                if let Some(slot) = self.addresses.iter_mut().find(|a| &a.id == id) {
                    *slot = updated.clone();
                }
                Ok(updated)
            }
            Err(e) => Err(self.fail(e.into(), "Failed to update address")),
        }
    }

    /// Delete a saved address.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Api` if the request fails.
    #[instrument(skip_all, fields(address_id = %id))]
    pub async fn delete(&mut self, token: &SecretString, id: &AddressId) -> Result<(), AddressError> {
        self.error = None;
        match self.api.delete_address(token, id).await {
            Ok(()) => {
                self.addresses.retain(|a| &a.id != id);
                tracing::info!("Address deleted");
                Ok(())
            }
            Err(e) => Err(self.fail(e.into(), "Failed to delete address")),
        }
    }

    /// Make an address the default. Every other address loses the flag.
    ///
    /// # Errors
    ///
    /// Returns `AddressError::Api` if the request fails.
    #[instrument(skip_all, fields(address_id = %id))]
    pub async fn set_default(
        &mut self,
        token: &SecretString,
        id: &AddressId,
    ) -> Result<(), AddressError> {
        self.error = None;
        match self.api.set_default_address(token, id).await {
            Ok(()) => {
                self.mark_default(id);
                Ok(())
            }
            Err(e) => Err(self.fail(e.into(), "Failed to set default address")),
        }
    }

    fn mark_default(&mut self, id: &AddressId) {
        for address in &mut self.addresses {
            address.is_default = &address.id == id;
        }
    }

    fn fail(&mut self, error: AddressError, fallback: &str) -> AddressError {
        let message = match &error {
            AddressError::Api(e) if e.is_malformed_response() => fallback.to_owned(),
            other => other.to_string(),
        };
        tracing::warn!(error = %error, "Address request failed");
        self.error = Some(message);
        error
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;

    fn api_address(id: &str, is_default: bool) -> ApiAddress {
        ApiAddress {
            id: AddressId::new(id),
            label: AddressKind::Home,
            street: format!("{id} Main Street"),
            city: "Kochi".into(),
            state: "KL".into(),
            zip_code: "682001".into(),
            latitude: None,
            longitude: None,
            is_default,
            created_at: None,
            updated_at: None,
        }
    }

    #[derive(Default)]
    struct FakeAddresses {
        stored: Mutex<Vec<ApiAddress>>,
        created: Mutex<Vec<CreateAddressRequest>>,
        fail: bool,
    }

    impl FakeAddresses {
        fn check(&self) -> Result<(), ApiError> {
            if self.fail {
                Err(ApiError::Status { status: 500 })
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl AddressApi for FakeAddresses {
        async fn list_addresses(&self, _: &SecretString) -> Result<Vec<ApiAddress>, ApiError> {
            self.check()?;
            Ok(self.stored.lock().unwrap().clone())
        }

        async fn create_address(
            &self,
            _: &SecretString,
            request: &CreateAddressRequest,
        ) -> Result<ApiAddress, ApiError> {
            self.check()?;
            self.created.lock().unwrap().push(request.clone());
            let mut address = api_address("new", request.is_default);
            address.label = request.label;
            Ok(address)
        }

        async fn update_address(
            &self,
            _: &SecretString,
            id: &AddressId,
            request: &UpdateAddressRequest,
        ) -> Result<ApiAddress, ApiError> {
            self.check()?;
            let mut address = api_address(id.as_str(), request.is_default.unwrap_or(false));
            if let Some(city) = &request.city {
                address.city.clone_from(city);
            }
            Ok(address)
        }

        async fn delete_address(&self, _: &SecretString, _: &AddressId) -> Result<(), ApiError> {
            self.check()
        }

        async fn set_default_address(
            &self,
            _: &SecretString,
            _: &AddressId,
        ) -> Result<(), ApiError> {
            self.check()
        }
    }

    fn token() -> SecretString {
        SecretString::from("tok-1")
    }

    async fn loaded_book() -> AddressBook {
        let api = FakeAddresses::default();
        *api.stored.lock().unwrap() = vec![
            api_address("a1", true),
            api_address("a2", false),
            api_address("a3", false),
        ];
        let mut book = AddressBook::new(Arc::new(api));
        book.load(&token()).await.unwrap();
        book
    }

    #[tokio::test]
    async fn test_set_default_flips_every_flag() {
        let mut book = loaded_book().await;
        assert_eq!(book.default_address().unwrap().id.as_str(), "a1");

        book.set_default(&token(), &AddressId::new("a3")).await.unwrap();
        let flags: Vec<bool> = book.addresses().iter().map(|a| a.is_default).collect();
        assert_eq!(flags, vec![false, false, true]);
    }

    #[tokio::test]
    async fn test_add_sends_both_zip_fields() {
        let api = Arc::new(FakeAddresses::default());
        let mut book = AddressBook::new(api.clone());

        let draft = AddressDraft {
            kind: AddressKind::Work,
            address: "1 Tech Park".into(),
            city: "Pune".into(),
            state: "MH".into(),
            zip_code: "411001".into(),
            ..AddressDraft::default()
        };
        let added = book.add(&token(), draft).await.unwrap();
        assert_eq!(added.kind, AddressKind::Work);

        let sent = api.created.lock().unwrap()[0].clone();
        assert_eq!(sent.zip, "411001");
        assert_eq!(sent.zip_code, "411001");
        assert!(sent.latitude.abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_add_validates_before_request() {
        let api = Arc::new(FakeAddresses::default());
        let mut book = AddressBook::new(api.clone());

        let err = book.add(&token(), AddressDraft::default()).await.unwrap_err();
        assert!(matches!(err, AddressError::Validation(_)));
        assert_eq!(book.error(), Some("City is required"));
        assert!(api.created.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let mut book = loaded_book().await;
        let patch = AddressPatch {
            city: Some("Thrissur".into()),
            ..AddressPatch::default()
        };
        book.update(&token(), &AddressId::new("a2"), patch).await.unwrap();
        assert_eq!(book.addresses()[1].city, "Thrissur");

        book.delete(&token(), &AddressId::new("a1")).await.unwrap();
        assert_eq!(book.addresses().len(), 2);
        assert!(book.default_address().is_none());
    }

    #[tokio::test]
    async fn test_failure_sets_error_and_keeps_list() {
        let mut book = loaded_book().await;
        book.api = Arc::new(FakeAddresses {
            fail: true,
            ..FakeAddresses::default()
        });

        let err = book
            .delete(&token(), &AddressId::new("a1"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Server error occurred");
        assert_eq!(book.error(), Some("Server error occurred"));
        assert_eq!(book.addresses().len(), 3);

        book.clear_error();
        assert_eq!(book.error(), None);
        book.reset();
        assert!(book.addresses().is_empty());
    }
}
