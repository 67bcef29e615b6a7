use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use sea_orm::{
    Condition, QueryFilter, QueryOrder, QuerySelect, TransactionTrait, prelude::*,
    sea_query::Expr,
};

use crate::{EngineError, Period, ResultEngine, Transaction, TransactionKind, transactions};

use super::super::{Engine, with_tx};

const DEFAULT_PAGE_SIZE: u64 = 50;

/// Filters for listing the transactions of a wallet.
#[derive(Clone, Debug)]
pub struct TransactionListFilter {
    /// Reporting period, resolved against the current time.
    pub period: Period,
    /// If present, acts as an allow-list of kinds to return.
    pub kinds: Option<Vec<TransactionKind>>,
    /// If present, acts as an allow-list of categories.
    pub categories: Option<Vec<Uuid>>,
    /// Case-insensitive substring of the title.
    pub search: Option<String>,
    pub limit: u64,
    /// Opaque cursor returned by the previous page.
    pub cursor: Option<String>,
}

impl Default for TransactionListFilter {
    fn default() -> Self {
        Self {
            period: Period::All,
            kinds: None,
            categories: None,
            search: None,
            limit: DEFAULT_PAGE_SIZE,
            cursor: None,
        }
    }
}

fn validate_list_filter(filter: &TransactionListFilter) -> ResultEngine<()> {
    if filter.limit == 0 {
        return Err(EngineError::InvalidAmount("limit must be > 0".to_string()));
    }
    if filter.kinds.as_ref().is_some_and(|k| k.is_empty()) {
        return Err(EngineError::InvalidKind(
            "kinds must not be empty".to_string(),
        ));
    }
    if filter.categories.as_ref().is_some_and(|c| c.is_empty()) {
        return Err(EngineError::InvalidCategories(
            "categories must not be empty".to_string(),
        ));
    }
    Ok(())
}

trait ApplyTxFilters: QueryFilter + Sized {
    fn apply_tx_filters(
        self,
        filter: &TransactionListFilter,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Self;
}

impl<T> ApplyTxFilters for T
where
    T: QueryFilter + Sized,
{
    fn apply_tx_filters(
        mut self,
        filter: &TransactionListFilter,
        range: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Self {
        if let Some((from, to)) = range {
            self = self
                .filter(transactions::Column::CreatedAt.gte(from))
                .filter(transactions::Column::CreatedAt.lt(to));
        }
        if let Some(kinds) = &filter.kinds {
            let kinds: Vec<&str> = kinds.iter().map(|k| k.as_str()).collect();
            self = self.filter(transactions::Column::Kind.is_in(kinds));
        }
        if let Some(categories) = &filter.categories {
            let categories: Vec<String> = categories.iter().map(Uuid::to_string).collect();
            self = self.filter(transactions::Column::CategoryId.is_in(categories));
        }
        if let Some(search) = filter.search.as_deref().map(str::trim)
            && !search.is_empty()
        {
            let pattern = format!("%{}%", search.to_lowercase());
            self = self.filter(Expr::expr(Expr::cust("LOWER(title)")).like(pattern));
        }
        self
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
struct TransactionsCursor {
    created_at: DateTime<Utc>,
    transaction_id: String,
}

impl TransactionsCursor {
    fn encode(&self) -> ResultEngine<String> {
        let bytes = serde_json::to_vec(self)
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))?;
        Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
    }

    fn decode(input: &str) -> ResultEngine<Self> {
        let bytes = base64::engine::general_purpose::URL_SAFE_NO_PAD
            .decode(input.as_bytes())
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))?;
        serde_json::from_slice::<Self>(&bytes)
            .map_err(|_| EngineError::InvalidCursor("invalid transactions cursor".to_string()))
    }
}

impl Engine {
    /// Lists the transactions of a wallet, newest first, one page at a time.
    ///
    /// Pagination is by `(created_at DESC, transaction_id DESC)`; the second
    /// element is the cursor of the next page, `None` on the last one.
    pub async fn list_transactions(
        &self,
        wallet_id: Uuid,
        filter: &TransactionListFilter,
    ) -> ResultEngine<(Vec<Transaction>, Option<String>)> {
        validate_list_filter(filter)?;
        let range = filter.period.range(Utc::now())?;
        let cursor = filter
            .cursor
            .as_deref()
            .map(TransactionsCursor::decode)
            .transpose()?;

        with_tx!(self, |db_tx| {
            self.require_wallet(&db_tx, wallet_id).await?;

            let limit = filter.limit;
            let mut query = transactions::Entity::find()
                .filter(transactions::Column::WalletId.eq(wallet_id.to_string()))
                .order_by_desc(transactions::Column::CreatedAt)
                .order_by_desc(transactions::Column::Id)
                .limit(limit.saturating_add(1));

            if let Some(cursor) = &cursor {
                query = query.filter(
                    Condition::any()
                        .add(transactions::Column::CreatedAt.lt(cursor.created_at))
                        .add(
                            Condition::all()
                                .add(transactions::Column::CreatedAt.eq(cursor.created_at))
                                .add(transactions::Column::Id.lt(cursor.transaction_id.clone())),
                        ),
                );
            }
            query = query.apply_tx_filters(filter, range);

            let rows: Vec<transactions::Model> = query.all(&db_tx).await?;
            let has_more = rows.len() as u64 > limit;

            let mut out: Vec<Transaction> = Vec::with_capacity(rows.len());
            for model in rows.into_iter().take(limit as usize) {
                out.push(Transaction::try_from(model)?);
            }

            let next_cursor = if has_more {
                out.last()
                    .map(|tx| TransactionsCursor {
                        created_at: tx.created_at,
                        transaction_id: tx.id.to_string(),
                    })
                    .map(|c| c.encode())
                    .transpose()?
            } else {
                None
            };

            Ok((out, next_cursor))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_survives_encoding() {
        let cursor = TransactionsCursor {
            created_at: Utc::now(),
            transaction_id: Uuid::new_v4().to_string(),
        };
        let decoded = TransactionsCursor::decode(&cursor.encode().unwrap()).unwrap();
        assert_eq!(decoded.created_at, cursor.created_at);
        assert_eq!(decoded.transaction_id, cursor.transaction_id);
    }

    #[test]
    fn garbage_cursor_is_rejected() {
        assert!(matches!(
            TransactionsCursor::decode("not a cursor!"),
            Err(EngineError::InvalidCursor(_))
        ));
    }

    #[test]
    fn empty_allow_lists_are_rejected() {
        let filter = TransactionListFilter {
            kinds: Some(Vec::new()),
            ..Default::default()
        };
        assert!(validate_list_filter(&filter).is_err());

        let filter = TransactionListFilter {
            limit: 0,
            ..Default::default()
        };
        assert!(validate_list_filter(&filter).is_err());
        assert!(validate_list_filter(&TransactionListFilter::default()).is_ok());
    }
}
