//! Buy-order orchestration
//!
//! Composes settings, the active gold price, the transaction log and the
//! payment gateway into the two core operations: `initiate_buy` turns a
//! rupee amount into a pending transaction plus an external payment order;
//! `finalize` resolves a pending transaction from a webhook or status poll
//! and credits the balance exactly once.

use crate::database::gold_price_repository::{GoldPrice, GoldPriceRepository};
use crate::database::settings_repository::SettingsRepository;
use crate::database::transaction_repository::{Transaction, TransactionRepository};
use crate::database::user_repository::UserRepository;
use crate::error::{AppError, AppErrorKind, AppResult, DomainError};
use crate::payments::factory::PaymentGatewayFactory;
use crate::payments::types::{OrderRequest, PaymentOrder, PaymentOutcome};
use crate::services::pricing::{
    compute_pricing, grams_for, round2, to_minor_units, FeeSchedule, PricingBreakdown,
};
use bigdecimal::BigDecimal;
use serde::Serialize;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Response of a successful buy initiation
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BuyReceipt {
    #[serde(rename = "tx")]
    pub transaction: Transaction,
    pub payment: PaymentOrder,
    pub pricing: PricingBreakdown,
}

/// Everything finalization needs, extracted from a webhook or status poll
#[derive(Debug, Clone, Default)]
pub struct FinalizeInstruction {
    pub transaction_id: Option<String>,
    pub user_id: Option<String>,
    pub outcome: Option<PaymentOutcome>,
    pub payment_id: Option<String>,
    pub order_id: Option<String>,
    pub provider: Option<String>,
}

/// What finalization actually did
#[derive(Debug)]
pub enum FinalizeResult {
    Completed(Box<Transaction>),
    Failed(Box<Transaction>),
    /// Missing identifiers, unknown transaction, already-finalized row, or a
    /// still-pending outcome
    NoOp,
}

pub struct BuyOrderService {
    settings_repo: SettingsRepository,
    price_repo: GoldPriceRepository,
    transaction_repo: TransactionRepository,
    user_repo: UserRepository,
    gateways: Arc<PaymentGatewayFactory>,
}

impl BuyOrderService {
    pub fn new(pool: PgPool, gateways: Arc<PaymentGatewayFactory>) -> Self {
        Self {
            settings_repo: SettingsRepository::new(pool.clone()),
            price_repo: GoldPriceRepository::new(pool.clone()),
            transaction_repo: TransactionRepository::new(pool.clone()),
            user_repo: UserRepository::new(pool),
            gateways,
        }
    }

    /// Current active gold price, seeding the default row on first access
    pub async fn active_price(&self) -> AppResult<GoldPrice> {
        Ok(self.price_repo.find_active_or_seed().await?)
    }

    /// Current gold balance in grams for a user; absent users read as zero
    pub async fn gold_balance(&self, user_id: Uuid) -> AppResult<BigDecimal> {
        let user = self.user_repo.find_by_uuid(user_id).await?;
        Ok(user
            .map(|u| u.gold_balance)
            .unwrap_or_else(|| BigDecimal::from(0)))
    }

    pub async fn transaction_by_id(&self, id: &str) -> AppResult<Option<Transaction>> {
        let Ok(uuid) = Uuid::parse_str(id) else {
            return Ok(None);
        };
        Ok(self.transaction_repo.find_by_uuid(uuid).await?)
    }

    /// Initiate a buy: validate, price, persist a pending transaction, and
    /// hand off to the payment provider.
    ///
    /// There is no rollback if order creation fails: the pending row stays
    /// behind and the error surfaces to the caller. Stuck rows are visible in
    /// the admin transaction listing.
    pub async fn initiate_buy(&self, user_id: Uuid, amount: BigDecimal) -> AppResult<BuyReceipt> {
        if amount <= BigDecimal::from(0) {
            return Err(AppError::new(AppErrorKind::Domain(
                DomainError::InvalidAmount {
                    amount: amount.to_string(),
                    reason: "Amount must be positive".to_string(),
                },
            )));
        }

        let settings = self.settings_repo.get_or_create().await?;
        if settings.maintenance_mode {
            return Err(AppError::new(AppErrorKind::Domain(
                DomainError::MaintenanceMode,
            )));
        }

        let min_buy = settings.min_buy_amount.max(1);
        if amount < BigDecimal::from(min_buy) {
            return Err(AppError::new(AppErrorKind::Domain(
                DomainError::BelowMinimumBuy {
                    minimum: min_buy.to_string(),
                },
            )));
        }

        let price = self.price_repo.find_active_or_seed().await?;
        let grams = grams_for(&amount, &price.price_per_gram);

        let schedule = FeeSchedule::from_settings(settings.fees.as_ref());
        let pricing = compute_pricing(&amount, &schedule);

        let transaction = self
            .transaction_repo
            .create_transaction(
                user_id,
                "buy",
                "pending",
                round2(&amount),
                grams,
                price.price_per_gram.clone(),
                pricing.metadata(&schedule),
            )
            .await?;

        info!(
            transaction_id = %transaction.id,
            user_id = %user_id,
            amount = %pricing.base_amount,
            grams = %transaction.gold_quantity,
            "buy order created, requesting payment order"
        );

        let payment = self
            .gateways
            .create_checkout_order(OrderRequest {
                amount_minor: to_minor_units(&pricing.total_payable),
                currency: "INR".to_string(),
                transaction_id: transaction.id.to_string(),
                user_id: user_id.to_string(),
            })
            .await
            .map_err(|e| {
                warn!(
                    transaction_id = %transaction.id,
                    error = %e,
                    "payment order creation failed; pending transaction left for reconciliation"
                );
                AppError::from(e)
            })?;

        Ok(BuyReceipt {
            transaction,
            payment,
            pricing,
        })
    }

    /// Finalize a transaction from a provider outcome.
    ///
    /// Crediting rides on the status-guarded update in the repository: the
    /// completed transition succeeds at most once per transaction, so a
    /// duplicate success webhook finds no pending row and becomes a NoOp
    /// without touching the balance.
    pub async fn finalize(&self, instruction: FinalizeInstruction) -> AppResult<FinalizeResult> {
        let (Some(tx_id), Some(_user_id)) = (
            instruction.transaction_id.as_deref(),
            instruction.user_id.as_deref(),
        ) else {
            return Ok(FinalizeResult::NoOp);
        };

        let Ok(tx_uuid) = Uuid::parse_str(tx_id) else {
            return Ok(FinalizeResult::NoOp);
        };

        match instruction.outcome {
            Some(PaymentOutcome::Success) => {
                let updated = self
                    .transaction_repo
                    .complete_pending(
                        tx_uuid,
                        instruction.payment_id.as_deref(),
                        instruction.order_id.as_deref(),
                        instruction.provider.as_deref(),
                    )
                    .await?;

                match updated {
                    Some(transaction) => {
                        self.user_repo
                            .increment_gold_balance(
                                transaction.user_id,
                                &transaction.gold_quantity,
                            )
                            .await?;
                        info!(
                            transaction_id = %transaction.id,
                            user_id = %transaction.user_id,
                            grams = %transaction.gold_quantity,
                            "transaction completed, balance credited"
                        );
                        Ok(FinalizeResult::Completed(Box::new(transaction)))
                    }
                    None => Ok(FinalizeResult::NoOp),
                }
            }
            Some(PaymentOutcome::Failed) => {
                let updated = self
                    .transaction_repo
                    .fail_pending(
                        tx_uuid,
                        instruction.payment_id.as_deref(),
                        instruction.order_id.as_deref(),
                        instruction.provider.as_deref(),
                    )
                    .await?;

                match updated {
                    Some(transaction) => {
                        info!(transaction_id = %transaction.id, "transaction marked failed");
                        Ok(FinalizeResult::Failed(Box::new(transaction)))
                    }
                    None => Ok(FinalizeResult::NoOp),
                }
            }
            Some(PaymentOutcome::Pending) | None => Ok(FinalizeResult::NoOp),
        }
    }
}
