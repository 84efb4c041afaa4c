use crate::database::{Database, Filter};
use crate::models::{Doctor, Specialty, SpecialtyRequest, SpecialtyResponse};
use crate::utils::{AppError, AppResult};

async fn ensure_unique_name(db: &Database, name: &str, except: Option<i64>) -> AppResult<()> {
    let clash = db
        .collection::<Specialty>()
        .find_one(&Filter::new().eq("name", name))
        .await?;
    match clash {
        Some(existing) if Some(existing.id) != except => {
            Err(AppError::Conflict(format!("Specialty '{}' already exists", name)))
        }
        _ => Ok(()),
    }
}

fn validated_name(request: &SpecialtyRequest) -> AppResult<String> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::InvalidRequest("Specialty name is required".to_string()));
    }
    Ok(name.to_string())
}

pub async fn create(db: &Database, request: &SpecialtyRequest) -> AppResult<SpecialtyResponse> {
    let name = validated_name(request)?;
    ensure_unique_name(db, &name, None).await?;

    let mut specialty = Specialty {
        id: 0,
        name,
        description: request.description.clone(),
    };
    db.collection::<Specialty>().insert(&mut specialty).await?;
    Ok(SpecialtyResponse::from(specialty))
}

pub async fn get_by_id(db: &Database, id: i64) -> AppResult<Option<SpecialtyResponse>> {
    Ok(db.collection::<Specialty>().get(id).await?.map(SpecialtyResponse::from))
}

pub async fn get_all(db: &Database) -> AppResult<Vec<SpecialtyResponse>> {
    let specialties = db.collection::<Specialty>().all().await?;
    Ok(specialties.into_iter().map(SpecialtyResponse::from).collect())
}

pub async fn update(db: &Database, id: i64, request: &SpecialtyRequest) -> AppResult<Option<SpecialtyResponse>> {
    let specialties = db.collection::<Specialty>();
    let Some(mut specialty) = specialties.get(id).await? else {
        return Ok(None);
    };

    let name = validated_name(request)?;
    ensure_unique_name(db, &name, Some(id)).await?;

    specialty.name = name;
    specialty.description = request.description.clone();
    specialties.replace(&specialty).await?;
    Ok(Some(SpecialtyResponse::from(specialty)))
}

/// Deletes the specialty. Doctors that had it keep their profile with no specialty.
pub async fn delete(db: &Database, id: i64) -> AppResult<bool> {
    if !db.collection::<Specialty>().delete(id).await? {
        return Ok(false);
    }

    let doctors = db.collection::<Doctor>();
    let affected = doctors.find(&Filter::new().eq("specialty_id", id)).await?;
    for mut doctor in affected {
        doctor.specialty_id = None;
        doctors.replace(&doctor).await?;
    }

    log::info!("🗑️ Specialty {} deleted", id);
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DoctorRequest;
    use crate::services::doctor_service;
    use crate::test_support::insert_user;

    fn request(name: &str) -> SpecialtyRequest {
        SpecialtyRequest { name: name.into(), description: Some("desc".into()) }
    }

    #[tokio::test]
    async fn crud_cycle() {
        let db = Database::in_memory();
        let created = create(&db, &request("Cardiology")).await.unwrap();
        assert_eq!(get_by_id(&db, created.specialty_id).await.unwrap(), Some(created.clone()));

        let renamed = update(&db, created.specialty_id, &request("Cardiología")).await.unwrap().unwrap();
        assert_eq!(renamed.specialty_id, created.specialty_id);
        assert_eq!(renamed.name, "Cardiología");

        assert!(delete(&db, created.specialty_id).await.unwrap());
        assert!(!delete(&db, created.specialty_id).await.unwrap());
        assert!(get_all(&db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn names_stay_unique_but_self_rename_is_allowed() {
        let db = Database::in_memory();
        let cardio = create(&db, &request("Cardiology")).await.unwrap();
        create(&db, &request("Neurology")).await.unwrap();

        assert!(matches!(create(&db, &request("Cardiology")).await, Err(AppError::Conflict(_))));
        assert!(matches!(
            update(&db, cardio.specialty_id, &request("Neurology")).await,
            Err(AppError::Conflict(_))
        ));
        assert!(update(&db, cardio.specialty_id, &request("Cardiology")).await.unwrap().is_some());
        assert!(update(&db, 99, &request("Oncology")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_clears_the_specialty_from_its_doctors() {
        let db = Database::in_memory();
        let cardio = create(&db, &request("Cardiology")).await.unwrap();
        let user = insert_user(&db, "house", "Gregory House").await;
        let doctor = doctor_service::create(
            &db,
            &DoctorRequest { user_id: user.id, specialty_id: Some(cardio.specialty_id), license_number: None },
        )
        .await
        .unwrap();

        assert!(delete(&db, cardio.specialty_id).await.unwrap());

        let after = doctor_service::get_by_id(&db, doctor.doctor_id).await.unwrap().unwrap();
        assert_eq!(after.specialty_id, None);
        assert_eq!(after.specialty_name, None);
    }
}
