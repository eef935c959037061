use chim_sales::{
    db::{create_orm_conn, create_pool},
    dto::bookings::{BookingLineInput, CreateBookingRequest, UpdateBookingStatusRequest},
    entity::{
        booking_items::{Column as BookingItemCol, Entity as BookingItems},
        products::ActiveModel as ProductActive,
        users::ActiveModel as UserActive,
    },
    error::AppError,
    middleware::auth::AuthUser,
    services::{admin_service, booking_service},
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, Set};
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

async fn create_product(state: &AppState, price: i64) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    ProductActive {
        id: Set(id),
        name: Set(format!("Flue Brush {id}")),
        description: Set(Some("Test catalog row".into())),
        price: Set(price),
        stock: Set(25),
        category: Set("accessories".into()),
        status: Set("published".into()),
        deleted_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(id)
}

fn booking_payload(product_id: Uuid) -> CreateBookingRequest {
    CreateBookingRequest {
        customer_name: "Mona K".into(),
        customer_email: Some("mona@example.com".into()),
        customer_phone: "0100000000".into(),
        governorate: "Cairo".into(),
        area: "Maadi".into(),
        address_line: Some("12 Road 9".into()),
        payment_method: "cod".into(),
        total: 3000,
        items: vec![BookingLineInput {
            product_id,
            quantity: 2,
            unit_price: 1500,
        }],
    }
}

// Public checkout persists parent and items; the response carries the parent only.
#[tokio::test]
async fn booking_checkout_persists_items() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let product_id = create_product(&state, 1500).await?;

    let resp = booking_service::create_booking(&state, booking_payload(product_id)).await?;
    let booking = resp.data.expect("booking data");

    assert!(booking.reference.starts_with("BK-"));
    assert_eq!(booking.status, "pending");
    // Submitted total is trusted, not recomputed.
    assert_eq!(booking.total, 3000);

    let items = BookingItems::find()
        .filter(BookingItemCol::BookingId.eq(booking.id))
        .all(&state.orm)
        .await?;
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, 2);
    assert_eq!(items[0].unit_price, 1500);

    Ok(())
}

#[tokio::test]
async fn booking_checkout_rejects_bad_input() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let product_id = create_product(&state, 900).await?;

    let mut payload = booking_payload(product_id);
    payload.items.clear();
    let err = booking_service::create_booking(&state, payload)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let mut payload = booking_payload(product_id);
    payload.customer_phone = "  ".into();
    let err = booking_service::create_booking(&state, payload)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let mut payload = booking_payload(product_id);
    payload.items[0].quantity = 0;
    let err = booking_service::create_booking(&state, payload)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    Ok(())
}

#[tokio::test]
async fn admin_updates_booking_status() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let product_id = create_product(&state, 700).await?;
    let admin = create_admin(&state).await?;

    let resp = booking_service::create_booking(&state, booking_payload(product_id)).await?;
    let booking = resp.data.expect("booking data");

    let resp = admin_service::update_booking_status(
        &state,
        &admin,
        booking.id,
        UpdateBookingStatusRequest {
            status: "confirmed".into(),
        },
    )
    .await?;
    assert_eq!(resp.data.expect("booking").status, "confirmed");

    // Any value outside the closed set is refused.
    let err = admin_service::update_booking_status(
        &state,
        &admin,
        booking.id,
        UpdateBookingStatusRequest {
            status: "shipped".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    // Non-admins are refused outright.
    let user = AuthUser {
        user_id: admin.user_id,
        role: "user".into(),
    };
    let err = admin_service::update_booking_status(
        &state,
        &user,
        booking.id,
        UpdateBookingStatusRequest {
            status: "cancelled".into(),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    Ok(())
}
