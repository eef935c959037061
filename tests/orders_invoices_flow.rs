use chim_sales::{
    db::{create_orm_conn, create_pool},
    dto::{
        invoices::{CreateInvoiceRequest, InvoiceLineInput, UpdateInvoiceRequest},
        orders::{CreateOrderRequest, OrderLineInput},
    },
    entity::{products::ActiveModel as ProductActive, users::ActiveModel as UserActive},
    error::AppError,
    middleware::auth::AuthUser,
    routes::params::{InvoiceListQuery, Pagination},
    services::{invoice_service, order_service},
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

async fn create_user(state: &AppState, role: &str) -> anyhow::Result<AuthUser> {
    let id = Uuid::new_v4();
    UserActive {
        id: Set(id),
        email: Set(format!("{role}-{id}@example.com")),
        password_hash: Set("not-a-real-hash".into()),
        name: Set(format!("Test {role}")),
        phone: Set(None),
        role: Set(role.into()),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(AuthUser {
        user_id: id,
        role: role.into(),
    })
}

async fn create_product(state: &AppState, price: i64, stock: i32) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    ProductActive {
        id: Set(id),
        name: Set(format!("Stove Pipe {id}")),
        description: Set(Some("Single-wall connector pipe".into())),
        price: Set(price),
        stock: Set(stock),
        category: Set("liners".into()),
        status: Set("published".into()),
        deleted_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;
    Ok(id)
}

// Order intake reprices lines from the catalog and derives a sent invoice
// whose number tracks the sequence.
#[tokio::test]
async fn order_create_derives_invoice() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, "user").await?;
    let admin = create_user(&state, "admin").await?;
    let cheap = create_product(&state, 1000, 30).await?;
    let dear = create_product(&state, 2500, 30).await?;

    let resp = order_service::create_order(
        &state,
        &user,
        CreateOrderRequest {
            shipping_address: "5 Kiln St".into(),
            governorate: "Giza".into(),
            discount_rate: Some(10),
            tax_rate: Some(14),
            items: vec![
                OrderLineInput {
                    product_id: cheap,
                    quantity: 3,
                },
                OrderLineInput {
                    product_id: dear,
                    quantity: 1,
                },
            ],
        },
    )
    .await?;
    let data = resp.data.expect("order data");

    // subtotal 5500, 10% discount 550, 14% tax on 4950 = 693
    assert_eq!(data.order.subtotal, 5500);
    assert_eq!(data.order.discount, 550);
    assert_eq!(data.order.tax, 693);
    assert_eq!(data.order.total, 5643);
    assert_eq!(data.items.len(), 2);
    // Prices come from the catalog, not the request.
    assert!(data.items.iter().any(|i| i.unit_price == 1000 && i.total == 3000));

    let invoice_id = data.order.invoice_id.expect("derived invoice");
    let invoice = invoice_service::get_invoice(&state, &admin, invoice_id)
        .await?
        .data
        .expect("invoice data");

    assert_eq!(invoice.invoice.status, "sent");
    assert_eq!(invoice.invoice.order_id, Some(data.order.id));
    assert_eq!(invoice.invoice.number, format!("INV-{}", invoice.invoice.seq));
    assert_eq!(invoice.invoice.total, data.order.total);
    assert_eq!(invoice.invoice.billing_address, "5 Kiln St, Giza");
    assert_eq!(invoice.items.len(), 2);

    // A second order draws the next number.
    let resp = order_service::create_order(
        &state,
        &user,
        CreateOrderRequest {
            shipping_address: "5 Kiln St".into(),
            governorate: "Giza".into(),
            discount_rate: None,
            tax_rate: None,
            items: vec![OrderLineInput {
                product_id: cheap,
                quantity: 1,
            }],
        },
    )
    .await?;
    let second = resp.data.expect("order data");
    let second_invoice_id = second.order.invoice_id.expect("derived invoice");
    let second_invoice = invoice_service::get_invoice(&state, &admin, second_invoice_id)
        .await?
        .data
        .expect("invoice data");
    assert!(second_invoice.invoice.seq > invoice.invoice.seq);

    Ok(())
}

#[tokio::test]
async fn order_create_rejects_unknown_product_and_bad_rates() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let user = create_user(&state, "user").await?;

    let err = order_service::create_order(
        &state,
        &user,
        CreateOrderRequest {
            shipping_address: "5 Kiln St".into(),
            governorate: "Giza".into(),
            discount_rate: None,
            tax_rate: None,
            items: vec![OrderLineInput {
                product_id: Uuid::new_v4(),
                quantity: 1,
            }],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    let product = create_product(&state, 500, 5).await?;
    let err = order_service::create_order(
        &state,
        &user,
        CreateOrderRequest {
            shipping_address: "5 Kiln St".into(),
            governorate: "Giza".into(),
            discount_rate: Some(101),
            tax_rate: None,
            items: vec![OrderLineInput {
                product_id: product,
                quantity: 1,
            }],
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    Ok(())
}

// Simultaneous creations must both succeed and draw distinct numbers; the
// allocation is serialized, not first-come-only.
#[tokio::test]
async fn concurrent_invoice_creates_get_distinct_numbers() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, "admin").await?;

    let payload = |name: &str| CreateInvoiceRequest {
        customer_name: name.into(),
        customer_email: None,
        billing_address: "1 Smoke Rd, Cairo".into(),
        discount_rate: None,
        tax_rate: None,
        due_date: None,
        items: vec![InvoiceLineInput {
            name: "Flue sweep".into(),
            description: None,
            quantity: 1,
            unit_price: 2000,
        }],
    };

    let (first, second) = tokio::join!(
        invoice_service::create_invoice(&state, &admin, payload("Concurrent A")),
        invoice_service::create_invoice(&state, &admin, payload("Concurrent B")),
    );
    let first = first?.data.expect("invoice data");
    let second = second?.data.expect("invoice data");

    assert_ne!(first.invoice.seq, second.invoice.seq);
    assert_ne!(first.invoice.number, second.invoice.number);

    Ok(())
}

#[tokio::test]
async fn invoice_admin_lifecycle() -> anyhow::Result<()> {
    let Some(state) = setup_state().await? else {
        return Ok(());
    };
    let admin = create_user(&state, "admin").await?;
    let user = create_user(&state, "user").await?;

    // Listing is admin-only.
    let err = invoice_service::list_invoices(
        &state,
        &user,
        InvoiceListQuery {
            pagination: Pagination {
                page: None,
                per_page: None,
            },
            status: None,
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::Forbidden));

    let resp = invoice_service::create_invoice(
        &state,
        &admin,
        CreateInvoiceRequest {
            customer_name: "Hassan B".into(),
            customer_email: None,
            billing_address: "9 Forge Ln, Alexandria".into(),
            discount_rate: None,
            tax_rate: None,
            due_date: None,
            items: vec![
                InvoiceLineInput {
                    name: "Chimney inspection".into(),
                    description: None,
                    quantity: 1,
                    unit_price: 4000,
                },
                InvoiceLineInput {
                    name: "Cowl fitting".into(),
                    description: Some("Includes hardware".into()),
                    quantity: 2,
                    unit_price: 1500,
                },
            ],
        },
    )
    .await?;
    let created = resp.data.expect("invoice data");
    assert_eq!(created.invoice.status, "draft");
    assert_eq!(created.invoice.subtotal, 7000);
    assert_eq!(created.invoice.total, 7000);
    assert_eq!(created.items.len(), 2);

    // A rate change recomputes the stored aggregates from the items.
    let resp = invoice_service::update_invoice(
        &state,
        &admin,
        created.invoice.id,
        UpdateInvoiceRequest {
            customer_name: None,
            customer_email: None,
            billing_address: None,
            discount_rate: Some(10),
            tax_rate: Some(14),
            due_date: None,
            status: Some("sent".into()),
        },
    )
    .await?;
    let updated = resp.data.expect("invoice data");
    assert_eq!(updated.status, "sent");
    assert_eq!(updated.subtotal, 7000);
    assert_eq!(updated.discount, 700);
    assert_eq!(updated.tax, 882);
    assert_eq!(updated.total, 7182);

    let err = invoice_service::update_invoice(
        &state,
        &admin,
        created.invoice.id,
        UpdateInvoiceRequest {
            customer_name: None,
            customer_email: None,
            billing_address: None,
            discount_rate: None,
            tax_rate: None,
            due_date: None,
            status: Some("shipped".into()),
        },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));

    invoice_service::delete_invoice(&state, &admin, created.invoice.id).await?;
    let err = invoice_service::get_invoice(&state, &admin, created.invoice.id)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound));

    Ok(())
}
