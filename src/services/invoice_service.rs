use chrono::{Duration, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, Statement, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::invoices::{CreateInvoiceRequest, InvoiceLineInput, InvoiceList, InvoiceWithItems, UpdateInvoiceRequest},
    entity::{
        invoice_items::{
            ActiveModel as InvoiceItemActive, Column as InvoiceItemCol, Entity as InvoiceItems,
            Model as InvoiceItemModel,
        },
        invoices::{
            ActiveModel as InvoiceActive, Column as InvoiceCol, Entity as Invoices,
            Model as InvoiceModel,
        },
        order_items::Model as OrderItemModel,
        orders::{ActiveModel as OrderActive, Model as OrderModel},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::{Invoice, InvoiceItem},
    response::{ApiResponse, Meta},
    routes::params::InvoiceListQuery,
    state::AppState,
    totals,
};

pub const INVOICE_STATUSES: [&str; 5] = ["draft", "sent", "paid", "overdue", "cancelled"];

const DUE_DAYS: i64 = 30;

/// Lock key for invoice number allocation.
const SEQ_LOCK_KEY: i64 = 0x4348_494d_5345_5131;

/// Next display number, last-plus-one. A transaction-scoped advisory lock
/// serializes allocation, including the first number on an empty table; it
/// is released at commit or rollback. The unique constraint on `seq` is the
/// storage-level backstop.
async fn next_seq<C: ConnectionTrait>(conn: &C) -> AppResult<i64> {
    conn.execute(Statement::from_sql_and_values(
        conn.get_database_backend(),
        "SELECT pg_advisory_xact_lock($1)",
        [SEQ_LOCK_KEY.into()],
    ))
    .await?;

    let last = Invoices::find()
        .order_by_desc(InvoiceCol::Seq)
        .one(conn)
        .await?;
    Ok(last.map(|i| i.seq).unwrap_or(0) + 1)
}

pub fn format_number(seq: i64) -> String {
    format!("INV-{seq}")
}

/// Standalone invoice creation by an admin.
pub async fn create_invoice(
    state: &AppState,
    user: &AuthUser,
    payload: CreateInvoiceRequest,
) -> AppResult<ApiResponse<InvoiceWithItems>> {
    ensure_admin(user)?;
    validate_invoice_input(&payload.items, payload.discount_rate, payload.tax_rate)?;
    if payload.customer_name.trim().is_empty() {
        return Err(AppError::BadRequest("customer_name is required".into()));
    }

    let discount_rate = payload.discount_rate.unwrap_or(0);
    let tax_rate = payload.tax_rate.unwrap_or(0);
    let due_date = payload
        .due_date
        .unwrap_or_else(|| (Utc::now() + Duration::days(DUE_DAYS)).date_naive());

    let txn = state.orm.begin().await?;

    let seq = next_seq(&txn).await?;
    let line_totals: Vec<i64> = payload
        .items
        .iter()
        .map(|l| totals::line_total(l.quantity, l.unit_price))
        .collect();
    let computed = totals::compute(&line_totals, discount_rate, tax_rate);

    let invoice = InvoiceActive {
        id: Set(Uuid::new_v4()),
        seq: Set(seq),
        number: Set(format_number(seq)),
        order_id: Set(None),
        customer_name: Set(payload.customer_name),
        customer_email: Set(payload.customer_email),
        billing_address: Set(payload.billing_address),
        status: Set("draft".into()),
        discount_rate: Set(discount_rate),
        tax_rate: Set(tax_rate),
        subtotal: Set(computed.subtotal),
        discount: Set(computed.discount),
        tax: Set(computed.tax),
        total: Set(computed.total),
        due_date: Set(due_date),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut items: Vec<InvoiceItemModel> = Vec::with_capacity(payload.items.len());
    for (line, total) in payload.items.iter().zip(line_totals) {
        let item = InvoiceItemActive {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(invoice.id),
            name: Set(line.name.clone()),
            description: Set(line.description.clone()),
            quantity: Set(line.quantity),
            unit_price: Set(line.unit_price),
            total: Set(total),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        items.push(item);
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "invoice_create",
        Some("invoices"),
        Some(serde_json::json!({ "invoice_id": invoice.id, "number": invoice.number })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Invoice created",
        InvoiceWithItems {
            invoice: invoice_from_entity(invoice),
            items: items.into_iter().map(invoice_item_from_entity).collect(),
        },
        Some(Meta::empty()),
    ))
}

/// Derive an invoice from a freshly created order: item snapshots and rates
/// are copied, due date is 30 days out, status starts at `sent`, and the
/// order row is linked back inside the same transaction.
pub async fn derive_for_order(
    state: &AppState,
    user: &AuthUser,
    order: &OrderModel,
    items: &[OrderItemModel],
) -> AppResult<InvoiceModel> {
    let customer = Users::find_by_id(user.user_id).one(&state.orm).await?;
    let (customer_name, customer_email) = match customer {
        Some(u) => (u.name, Some(u.email)),
        None => return Err(AppError::NotFound),
    };

    let txn = state.orm.begin().await?;

    let seq = next_seq(&txn).await?;
    let due_date = (Utc::now() + Duration::days(DUE_DAYS)).date_naive();

    let invoice = InvoiceActive {
        id: Set(Uuid::new_v4()),
        seq: Set(seq),
        number: Set(format_number(seq)),
        order_id: Set(Some(order.id)),
        customer_name: Set(customer_name),
        customer_email: Set(customer_email),
        billing_address: Set(format!("{}, {}", order.shipping_address, order.governorate)),
        status: Set("sent".into()),
        discount_rate: Set(order.discount_rate),
        tax_rate: Set(order.tax_rate),
        subtotal: Set(order.subtotal),
        discount: Set(order.discount),
        tax: Set(order.tax),
        total: Set(order.total),
        due_date: Set(due_date),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    for item in items {
        InvoiceItemActive {
            id: Set(Uuid::new_v4()),
            invoice_id: Set(invoice.id),
            name: Set(item.name.clone()),
            description: Set(item.description.clone()),
            quantity: Set(item.quantity),
            unit_price: Set(item.unit_price),
            total: Set(item.total),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
    }

    let mut order_active: OrderActive = order.clone().into();
    order_active.invoice_id = Set(Some(invoice.id));
    order_active.updated_at = Set(Utc::now().into());
    order_active.update(&txn).await?;

    txn.commit().await?;

    Ok(invoice)
}

pub async fn list_invoices(
    state: &AppState,
    user: &AuthUser,
    query: InvoiceListQuery,
) -> AppResult<ApiResponse<InvoiceList>> {
    ensure_admin(user)?;
    let (page, limit, offset) = query.pagination.normalize();

    let mut condition = Condition::all();
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(InvoiceCol::Status.eq(status.clone()));
    }

    let finder = Invoices::find()
        .filter(condition)
        .order_by_desc(InvoiceCol::Seq);

    let total = finder.clone().count(&state.orm).await? as i64;

    let invoices = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(invoice_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Invoices",
        InvoiceList { items: invoices },
        Some(meta),
    ))
}

pub async fn get_invoice(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<InvoiceWithItems>> {
    ensure_admin(user)?;
    let invoice = Invoices::find_by_id(id).one(&state.orm).await?;
    let invoice = match invoice {
        Some(i) => i,
        None => return Err(AppError::NotFound),
    };

    let items = InvoiceItems::find()
        .filter(InvoiceItemCol::InvoiceId.eq(invoice.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(invoice_item_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Invoice",
        InvoiceWithItems {
            invoice: invoice_from_entity(invoice),
            items,
        },
        Some(Meta::empty()),
    ))
}

/// Header-field update. A rate change recomputes the stored aggregates from
/// the persisted items; item edits are not supported here.
pub async fn update_invoice(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateInvoiceRequest,
) -> AppResult<ApiResponse<Invoice>> {
    ensure_admin(user)?;

    if let Some(status) = payload.status.as_ref() {
        validate_invoice_status(status)?;
    }
    if let Some(rate) = payload.discount_rate {
        if !totals::valid_rate(rate) {
            return Err(AppError::BadRequest("Invalid discount_rate".into()));
        }
    }
    if let Some(rate) = payload.tax_rate {
        if !totals::valid_rate(rate) {
            return Err(AppError::BadRequest("Invalid tax_rate".into()));
        }
    }

    let existing = Invoices::find_by_id(id).one(&state.orm).await?;
    let existing = match existing {
        Some(i) => i,
        None => return Err(AppError::NotFound),
    };

    let discount_rate = payload.discount_rate.unwrap_or(existing.discount_rate);
    let tax_rate = payload.tax_rate.unwrap_or(existing.tax_rate);
    let rates_changed =
        discount_rate != existing.discount_rate || tax_rate != existing.tax_rate;

    let mut active: InvoiceActive = existing.into();
    if let Some(name) = payload.customer_name {
        active.customer_name = Set(name);
    }
    if let Some(email) = payload.customer_email {
        active.customer_email = Set(Some(email));
    }
    if let Some(address) = payload.billing_address {
        active.billing_address = Set(address);
    }
    if let Some(due) = payload.due_date {
        active.due_date = Set(due);
    }
    if let Some(status) = payload.status {
        active.status = Set(status);
    }

    if rates_changed {
        let line_totals: Vec<i64> = InvoiceItems::find()
            .filter(InvoiceItemCol::InvoiceId.eq(id))
            .all(&state.orm)
            .await?
            .into_iter()
            .map(|item| item.total)
            .collect();
        let computed = totals::compute(&line_totals, discount_rate, tax_rate);
        active.discount_rate = Set(discount_rate);
        active.tax_rate = Set(tax_rate);
        active.subtotal = Set(computed.subtotal);
        active.discount = Set(computed.discount);
        active.tax = Set(computed.tax);
        active.total = Set(computed.total);
    }

    active.updated_at = Set(Utc::now().into());
    let invoice = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "invoice_update",
        Some("invoices"),
        Some(serde_json::json!({ "invoice_id": invoice.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Invoice updated",
        invoice_from_entity(invoice),
        Some(Meta::empty()),
    ))
}

/// Invoices are hard-deleted, items first.
pub async fn delete_invoice(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    ensure_admin(user)?;

    let txn = state.orm.begin().await?;

    InvoiceItems::delete_many()
        .filter(InvoiceItemCol::InvoiceId.eq(id))
        .exec(&txn)
        .await?;

    let result = Invoices::delete_by_id(id).exec(&txn).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "invoice_delete",
        Some("invoices"),
        Some(serde_json::json!({ "invoice_id": id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

fn validate_invoice_input(
    items: &[InvoiceLineInput],
    discount_rate: Option<i64>,
    tax_rate: Option<i64>,
) -> Result<(), AppError> {
    if items.is_empty() {
        return Err(AppError::BadRequest("items must not be empty".into()));
    }
    for line in items {
        if line.name.trim().is_empty() {
            return Err(AppError::BadRequest("item name is required".into()));
        }
        if line.quantity <= 0 {
            return Err(AppError::BadRequest(
                "quantity must be greater than 0".into(),
            ));
        }
        if line.unit_price < 0 {
            return Err(AppError::BadRequest("unit_price must not be negative".into()));
        }
    }
    if let Some(rate) = discount_rate {
        if !totals::valid_rate(rate) {
            return Err(AppError::BadRequest("Invalid discount_rate".into()));
        }
    }
    if let Some(rate) = tax_rate {
        if !totals::valid_rate(rate) {
            return Err(AppError::BadRequest("Invalid tax_rate".into()));
        }
    }
    Ok(())
}

pub fn validate_invoice_status(status: &str) -> Result<(), AppError> {
    if INVOICE_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid invoice status".into()))
    }
}

pub(crate) fn invoice_from_entity(model: InvoiceModel) -> Invoice {
    Invoice {
        id: model.id,
        seq: model.seq,
        number: model.number,
        order_id: model.order_id,
        customer_name: model.customer_name,
        customer_email: model.customer_email,
        billing_address: model.billing_address,
        status: model.status,
        discount_rate: model.discount_rate,
        tax_rate: model.tax_rate,
        subtotal: model.subtotal,
        discount: model.discount,
        tax: model.tax,
        total: model.total,
        due_date: model.due_date,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub(crate) fn invoice_item_from_entity(model: InvoiceItemModel) -> InvoiceItem {
    InvoiceItem {
        id: model.id,
        invoice_id: model.invoice_id,
        name: model.name,
        description: model.description,
        quantity: model.quantity,
        unit_price: model.unit_price,
        total: model.total,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn number_format_is_prefixed_seq() {
        assert_eq!(format_number(1), "INV-1");
        assert_eq!(format_number(42), "INV-42");
    }

    #[test]
    fn status_set_is_closed() {
        for s in INVOICE_STATUSES {
            assert!(validate_invoice_status(s).is_ok());
        }
        assert!(validate_invoice_status("shipped").is_err());
    }
}
