//! Payment verification against a ledger transaction.

use thiserror::Error;

use datagate_types::{AccessRequest, Address, Amount, DatasetId, LedgerTransaction};

/// Why a ledger transaction does not pay for a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PaymentRejection {
    /// The ledger has no such transaction.
    #[error("transaction not found on ledger")]
    NotFound,

    /// The transaction did not succeed.
    #[error("transaction did not succeed")]
    Failed,

    /// Sent by someone other than the requester.
    #[error("sender {actual} is not the requester {expected}")]
    WrongSender {
        /// The requester
        expected: Address,
        /// The transaction's sender
        actual: Address,
    },

    /// Paid to someone other than the owner.
    #[error("recipient {actual} is not the owner {expected}")]
    WrongRecipient {
        /// The owner
        expected: Address,
        /// The transaction's recipient
        actual: Address,
    },

    /// Transferred less than the request's price.
    #[error("amount {paid} is below price {price}")]
    Underpaid {
        /// The request's price
        price: Amount,
        /// Amount transferred
        paid: Amount,
    },

    /// The transaction references a different dataset.
    #[error("transaction references dataset {actual}, not {expected}")]
    WrongDataset {
        /// The requested dataset
        expected: DatasetId,
        /// The dataset named by the transaction
        actual: DatasetId,
    },
}

/// Check that `tx` pays for `request`.
///
/// The transaction must have succeeded and moved at least the request's
/// price from the requester to the owner. A transaction that names a dataset
/// must name this one.
pub fn verify_payment(
    request: &AccessRequest,
    tx: Option<&LedgerTransaction>,
) -> Result<(), PaymentRejection> {
    let tx = tx.ok_or(PaymentRejection::NotFound)?;

    if !tx.succeeded {
        return Err(PaymentRejection::Failed);
    }
    if tx.from != request.requester {
        return Err(PaymentRejection::WrongSender {
            expected: request.requester.clone(),
            actual: tx.from.clone(),
        });
    }
    if tx.to != request.owner {
        return Err(PaymentRejection::WrongRecipient {
            expected: request.owner.clone(),
            actual: tx.to.clone(),
        });
    }
    if tx.amount < request.price {
        return Err(PaymentRejection::Underpaid {
            price: request.price,
            paid: tx.amount,
        });
    }
    if let Some(dataset) = &tx.dataset_ref {
        if dataset != &request.dataset {
            return Err(PaymentRejection::WrongDataset {
                expected: request.dataset.clone(),
                actual: dataset.clone(),
            });
        }
    }

    Ok(())
}
