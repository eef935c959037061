use chim_sales::{
    db::{create_orm_conn, create_pool},
    dto::products::{CreateProductRequest, ImageInput, UpdateProductRequest},
    entity::users::ActiveModel as UserActive,
    error::AppError,
    middleware::auth::AuthUser,
    services::product_service,
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, Set};
use uuid::Uuid;

async fn setup_state() -> anyhow::Result<Option<AppState>> {
    let database_url =
        match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
            Ok(url) => url,
            Err(_) => {
                eprintln!(
                    "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
                );
                return Ok(None);
            }
        };

    let pool = create_pool(&database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    let orm = create_orm_conn(&database_url).await?;
    Ok(Some(AppState { pool, orm }))
}

async fn create_admin(state: &AppState) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    UserActive {
        id: Set(id),
        email: Set(format!("admin-{id}@example.com")),
        password_hash: Set("not-a-real-hash".into()),
        name: Set("Admin".into()),
        phone: Set(None),
        role: Set("admin".into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser {
        user_id: id,
        role: "admin".into(),
    })
}

fn no_field_update() -> UpdateProductRequest {
    UpdateProductRequest {
        name: None,
        description: None,
        price: None,
        stock: None,
        category: None,
        status: None,
        images: None,
    }
}

// Sending an images array replaces the whole set; omitting it leaves the
// set untouched.
#[tokio::test]
async fn product_update_replaces_image_set() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_admin(&state).await?;

    let product = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: format!("Twin-Wall Flue Kit {}", Uuid::new_v4()),
            description: "Insulated kit with wall bracket".into(),
            price: 68000,
            stock: 6,
            category: "liners".into(),
        },
    )
    .await?
    .data
    .expect("product data");
    assert_eq!(product.status, "draft");

    let mut payload = no_field_update();
    payload.images = Some(vec![
        ImageInput {
            url: "https://img.example.com/kit-front.jpg".into(),
            public_id: "kit-front".into(),
        },
        ImageInput {
            url: "https://img.example.com/kit-side.jpg".into(),
            public_id: "kit-side".into(),
        },
    ]);
    let updated = product_service::update_product(&state, &admin, product.id, payload)
        .await?
        .data
        .expect("product data");
    assert_eq!(updated.images.len(), 2);

    let mut payload = no_field_update();
    payload.images = Some(vec![ImageInput {
        url: "https://img.example.com/kit-hero.jpg".into(),
        public_id: "kit-hero".into(),
    }]);
    let updated = product_service::update_product(&state, &admin, product.id, payload)
        .await?
        .data
        .expect("product data");
    assert_eq!(updated.images.len(), 1);
    assert_eq!(updated.images[0].public_id, "kit-hero");

    // Field-only update keeps the set.
    let mut payload = no_field_update();
    payload.status = Some("published".into());
    let updated = product_service::update_product(&state, &admin, product.id, payload)
        .await?
        .data
        .expect("product data");
    assert_eq!(updated.product.status, "published");
    assert_eq!(updated.images.len(), 1);

    Ok(())
}

#[tokio::test]
async fn soft_deleted_product_disappears() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_admin(&state).await?;

    let product = product_service::create_product(
        &state,
        &admin,
        CreateProductRequest {
            name: format!("Hearth Plate {}", Uuid::new_v4()),
            description: "Steel hearth plate".into(),
            price: 12000,
            stock: 10,
            category: "accessories".into(),
        },
    )
    .await?
    .data
    .expect("product data");

    product_service::delete_product(&state, &admin, product.id).await?;

    let err = product_service::get_product(&state, product.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    // A second delete finds nothing.
    let err = product_service::delete_product(&state, &admin, product.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}
