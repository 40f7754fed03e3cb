//! # Lease Module
//!
//! Scoped ownership of a pet created on the remote store.
//!
//! [`with_created_pet`] creates a pet, hands a [`PetLease`] to the case body
//! and deletes the pet afterwards on every exit path:
//!
//! | body outcome         | cleanup                                  | result                |
//! |----------------------|------------------------------------------|-----------------------|
//! | `Ok`                 | delete, response must be 2xx             | body value or delete failure |
//! | `Err`                | best-effort delete, failures logged      | the body's error      |
//! | panic                | best-effort delete, failures logged      | panic resumed         |
//! | future dropped       | drop guard spawns a best-effort delete   | -                     |
//! | create lost in transit | best-effort delete of the requested id | the transport error   |
//!
//! A body that deletes the pet itself through [`PetLease::delete`] releases
//! the lease, and no further delete is issued.
//!
//! ```rust,no_run
//! use petstore_e2e::client::PetStoreClient;
//! use petstore_e2e::expect::expect_ok;
//! use petstore_e2e::lease::with_created_pet;
//! use petstore_e2e::model::Pet;
//!
//! # async fn demo(client: PetStoreClient) -> Result<(), petstore_e2e::error::CaseError> {
//! with_created_pet(&client, &Pet::fresh(), |lease| async move {
//!     let fetched = lease.client().get_pet(lease.id()).await?;
//!     expect_ok(&fetched, "get pet")
//! })
//! .await
//! # }
//! ```

use crate::client::{PetStoreClient, Reply};
use crate::error::{CaseError, ClientError};
use crate::expect::{expect_eq, expect_ok};
use crate::ids::PetId;
use crate::model::Pet;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

#[derive(Debug)]
struct LeaseInner {
    client: PetStoreClient,
    pet: Pet,
    released: AtomicBool,
}

impl Drop for LeaseInner {
    fn drop(&mut self) {
        if self.released.load(Ordering::SeqCst) {
            return;
        }
        let id = self.pet.id;
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            warn!(pet_id = %id, "pet lease dropped outside a runtime, pet left behind");
            return;
        };
        let client = self.client.clone();
        handle.spawn(async move {
            match client.delete_pet(id).await {
                Ok(reply) => debug!(pet_id = %id, status = reply.status().as_u16(), "drop guard deleted pet"),
                Err(err) => warn!(pet_id = %id, error = %err, "drop guard could not delete pet"),
            }
        });
    }
}

/// Handle to a pet this case created. Clones share the release flag.
#[derive(Debug, Clone)]
pub struct PetLease {
    inner: Arc<LeaseInner>,
}

impl PetLease {
    fn new(client: PetStoreClient, pet: Pet) -> Self {
        Self {
            inner: Arc::new(LeaseInner {
                client,
                pet,
                released: AtomicBool::new(false),
            }),
        }
    }

    pub fn id(&self) -> PetId {
        self.inner.pet.id
    }

    /// The pet as the service echoed it back on creation.
    pub fn pet(&self) -> &Pet {
        &self.inner.pet
    }

    pub fn client(&self) -> &PetStoreClient {
        &self.inner.client
    }

    pub fn is_released(&self) -> bool {
        self.inner.released.load(Ordering::SeqCst)
    }

    /// `DELETE pet/{id}`. A 2xx response releases the lease.
    pub async fn delete(&self) -> Result<Reply, ClientError> {
        let reply = self.inner.client.delete_pet(self.id()).await?;
        if reply.ok() {
            self.release();
        }
        Ok(reply)
    }

    fn release(&self) {
        self.inner.released.store(true, Ordering::SeqCst);
    }

    async fn cleanup_best_effort(&self) {
        if self.is_released() {
            return;
        }
        match self.delete().await {
            Ok(reply) if reply.ok() => debug!(pet_id = %self.id(), "cleanup deleted pet"),
            Ok(reply) => warn!(pet_id = %self.id(), response = %reply.describe(), "cleanup delete rejected"),
            Err(err) => warn!(pet_id = %self.id(), error = %err, "cleanup delete failed"),
        }
        self.release();
    }
}

/// Create `pet`, run `body` with the lease, then make sure the pet is gone.
///
/// Creation must answer 2xx with the id that was sent. Once the create
/// request got a 2xx, the pet is deleted whatever happens next.
pub async fn with_created_pet<F, Fut, T>(
    client: &PetStoreClient,
    pet: &Pet,
    body: F,
) -> Result<T, CaseError>
where
    F: FnOnce(PetLease) -> Fut,
    Fut: Future<Output = Result<T, CaseError>>,
{
    let created = match client.add_pet(pet).await {
        Ok(reply) => reply,
        Err(err @ ClientError::Transport { .. }) => {
            // The store may have kept the pet even though the reply was lost.
            match client.delete_pet(pet.id).await {
                Ok(reply) => debug!(pet_id = %pet.id, status = reply.status().as_u16(), "deleted pet after failed create"),
                Err(cleanup) => warn!(pet_id = %pet.id, error = %cleanup, "could not delete pet after failed create"),
            }
            return Err(err.into());
        }
        Err(err) => return Err(err.into()),
    };
    expect_ok(&created, "create pet")?;

    let echoed = created
        .json::<Pet>("created pet")
        .map_err(CaseError::from)
        .and_then(|echoed| {
            expect_eq(echoed.id, pet.id, "create pet: returned id")?;
            Ok(echoed)
        });
    let lease = PetLease::new(
        client.clone(),
        echoed.as_ref().map_or_else(|_| pet.clone(), Clone::clone),
    );
    if let Err(err) = echoed {
        lease.cleanup_best_effort().await;
        return Err(err);
    }

    let outcome = AssertUnwindSafe(body(lease.clone())).catch_unwind().await;
    match outcome {
        Ok(Ok(value)) => {
            if !lease.is_released() {
                let deleted = lease.delete().await;
                lease.release();
                expect_ok(&deleted?, "cleanup: delete pet")?;
            }
            Ok(value)
        }
        Ok(Err(err)) => {
            lease.cleanup_best_effort().await;
            Err(err)
        }
        Err(panic) => {
            lease.cleanup_best_effort().await;
            std::panic::resume_unwind(panic)
        }
    }
}
