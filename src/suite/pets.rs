use super::case::{Case, CaseContext, CaseKind};
use crate::client::{ImageUpload, PetStoreClient};
use crate::error::CaseError;
use crate::expect::{expect_eq, expect_not_ok, expect_ok, expect_status, expect_true};
use crate::ids::PetId;
use crate::lease::with_created_pet;
use crate::model::{ApiMessage, Pet, PetStatus};
use serde_json::json;
use std::path::Path;

pub const RENAMED: &str = "doggieRenamed";
pub const FORM_RENAMED: &str = "doggieRenamed2";

/// Every pet case in declaration order.
pub fn cases() -> Vec<Case> {
    vec![
        Case::new(
            1001,
            "Adds new pet to the store. Gets the pet by id to check if created successfully, then deletes pet",
            CaseKind::Positive,
            create_read_delete,
        ),
        Case::new(
            1002,
            "gets all pets by status, confirms status is available",
            CaseKind::Positive,
            find_available,
        ),
        Case::new(
            1003,
            "creates a pet, updates the name, gets pet to confirm the update, then delete pet",
            CaseKind::Positive,
            replace_and_verify,
        ),
        Case::new(
            1004,
            "creates a pet, updates fields name and status using petID via form data, gets pet to confirm the update, then deletes pet",
            CaseKind::Positive,
            form_update_and_verify,
        ),
        Case::new(
            1005,
            "creates a pet and deletes it by ID",
            CaseKind::Positive,
            create_delete,
        ),
        Case::new(
            1006,
            "creates a Pet, uploads image, delete Pet",
            CaseKind::Positive,
            upload_image,
        ),
        Case::new(
            2001,
            "attempt to create a new pet with an invalid ID, check response rejects request.",
            CaseKind::Negative,
            reject_invalid_id,
        ),
        Case::new(
            2002,
            "Search for a pet that does not exist, return 404",
            CaseKind::Negative,
            missing_pet_is_404,
        ),
        Case::new(
            2003,
            "creates a pet, deletes it, deleting it again returns 404",
            CaseKind::Negative,
            repeat_delete_is_404,
        ),
    ]
}

async fn fetch(client: &PetStoreClient, id: PetId, step: &str) -> Result<Pet, CaseError> {
    let reply = client.get_pet(id).await?;
    expect_ok(&reply, step)?;
    Ok(reply.json("pet")?)
}

async fn create_read_delete(ctx: CaseContext) -> Result<(), CaseError> {
    with_created_pet(&ctx.client, &Pet::fresh(), |lease| async move {
        let fetched = fetch(lease.client(), lease.id(), "get pet").await?;
        expect_eq(fetched.id, lease.id(), "get pet: id")?;

        let deleted = lease.delete().await?;
        expect_ok(&deleted, "delete pet")
    })
    .await
}

async fn find_available(ctx: CaseContext) -> Result<(), CaseError> {
    let reply = ctx.client.find_by_status(PetStatus::Available).await?;
    expect_ok(&reply, "find by status")?;

    // The shared service holds arbitrary third-party entries; only `status` is relied on.
    let pets: Vec<serde_json::Value> = reply.json("pet list")?;
    let available = pets
        .iter()
        .any(|pet| pet.get("status").and_then(|s| s.as_str()) == Some(PetStatus::Available.as_str()));
    expect_true(
        available,
        "find by status",
        format!("none of {} returned pets has status \"available\"", pets.len()),
    )
}

async fn replace_and_verify(ctx: CaseContext) -> Result<(), CaseError> {
    with_created_pet(&ctx.client, &Pet::fresh(), |lease| async move {
        let renamed = lease.pet().clone().with_name(RENAMED);
        let replaced = lease.client().update_pet(&renamed).await?;
        expect_ok(&replaced, "update pet")?;

        let fetched = fetch(lease.client(), lease.id(), "get updated pet").await?;
        expect_eq(fetched.id, lease.id(), "get updated pet: id")?;
        expect_eq(fetched.name.as_str(), RENAMED, "get updated pet: name")?;

        let deleted = lease.delete().await?;
        expect_ok(&deleted, "delete pet")
    })
    .await
}

async fn form_update_and_verify(ctx: CaseContext) -> Result<(), CaseError> {
    with_created_pet(&ctx.client, &Pet::fresh(), |lease| async move {
        let updated = lease
            .client()
            .update_pet_with_form(lease.id(), Some(FORM_RENAMED), Some(PetStatus::Sold))
            .await?;
        expect_ok(&updated, "update pet with form")?;

        let fetched = fetch(lease.client(), lease.id(), "get updated pet").await?;
        expect_eq(fetched.id, lease.id(), "get updated pet: id")?;
        expect_eq(fetched.name.as_str(), FORM_RENAMED, "get updated pet: name")?;

        let deleted = lease.delete().await?;
        expect_ok(&deleted, "delete pet")
    })
    .await
}

async fn create_delete(ctx: CaseContext) -> Result<(), CaseError> {
    with_created_pet(&ctx.client, &Pet::fresh(), |lease| async move {
        let deleted = lease.delete().await?;
        expect_ok(&deleted, "delete pet")
    })
    .await
}

async fn upload_image(ctx: CaseContext) -> Result<(), CaseError> {
    let asset = read_asset(&ctx.config.asset_path).await?;
    with_created_pet(&ctx.client, &Pet::fresh(), |lease| async move {
        let uploaded = lease.client().upload_image(lease.id(), asset).await?;
        expect_ok(&uploaded, "upload image")?;
        let message: ApiMessage = uploaded.json("upload response")?;
        expect_eq(message.code, Some(200), "upload image: code")?;

        let deleted = lease.delete().await?;
        expect_ok(&deleted, "delete pet")
    })
    .await
}

async fn read_asset(path: &Path) -> Result<ImageUpload, CaseError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|err| CaseError::Setup(format!("cannot read upload asset {}: {err}", path.display())))?;
    let file_name = path
        .file_name()
        .map_or_else(|| "dog.jpeg".to_string(), |name| name.to_string_lossy().into_owned());
    Ok(ImageUpload::jpeg(file_name, bytes))
}

async fn reject_invalid_id(ctx: CaseContext) -> Result<(), CaseError> {
    let mut body = serde_json::to_value(Pet::fresh().with_status(PetStatus::Sold))
        .map_err(|err| CaseError::Setup(format!("cannot build pet payload: {err}")))?;
    body["id"] = json!("#");

    let reply = ctx.client.add_pet_raw(&body).await?;
    expect_not_ok(&reply, "create pet with id \"#\"")
}

async fn missing_pet_is_404(ctx: CaseContext) -> Result<(), CaseError> {
    let reply = ctx.client.get_pet(PetId::random()).await?;
    expect_status(&reply, 404, "get missing pet")
}

async fn repeat_delete_is_404(ctx: CaseContext) -> Result<(), CaseError> {
    with_created_pet(&ctx.client, &Pet::fresh(), |lease| async move {
        let first = lease.delete().await?;
        expect_ok(&first, "delete pet")?;

        let second = lease.client().delete_pet(lease.id()).await?;
        expect_status(&second, 404, "delete pet again")
    })
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn ids_are_unique_and_grouped_by_kind() {
        let cases = cases();
        let ids: HashSet<u16> = cases.iter().map(|c| c.id).collect();
        assert_eq!(ids.len(), cases.len());
        for case in &cases {
            let expected = if case.id < 2000 { "positive" } else { "negative" };
            assert_eq!(case.group, expected, "{}", case.full_title());
        }
    }

    #[tokio::test]
    async fn unreadable_asset_is_a_setup_error() {
        let err = read_asset(Path::new("/no/such/dog.jpeg")).await.unwrap_err();
        assert_eq!(err.kind(), "setup");
        assert!(err.to_string().contains("/no/such/dog.jpeg"));
    }
}
