//! Transfer intents.
//!
//! A Zilliqa transfer is described by exactly two `transfer` operations: a
//! debit of the sender (negative amount) and a credit of the recipient
//! (positive amount) of equal magnitude in ZIL. Anything else is rejected
//! before any lookup or encoding happens.

use crate::address::Address;
use crate::error::{ConstructionError, Result};
use crate::transaction::NativeTransaction;
use crate::types::{AccountIdentifier, Amount, Operation, OperationIdentifier, OperationType};

/// The chain-agnostic description of a payment, built from operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferIntent {
    pub sender: Address,
    pub recipient: Address,
    /// Amount in Qa. Never zero.
    pub amount: u128,
}

impl TransferIntent {
    /// Validates a debit/credit pair.
    pub fn from_operations(operations: &[Operation]) -> Result<Self> {
        if operations.len() != 2 {
            return Err(invalid(format!(
                "expected 2 operations (debit and credit), got {}",
                operations.len()
            )));
        }
        if operations[0].operation_identifier.index == operations[1].operation_identifier.index {
            return Err(invalid("operation indices must be distinct"));
        }

        let mut debit: Option<(Address, u128)> = None;
        let mut credit: Option<(Address, u128)> = None;

        for op in operations {
            let (address, value) = parse_transfer(op)?;
            let slot = if value < 0 { &mut debit } else { &mut credit };
            if slot.is_some() {
                return Err(invalid("transfer needs one negative and one positive amount"));
            }
            *slot = Some((address, value.unsigned_abs()));
        }

        let (sender, sent) = debit.ok_or_else(|| invalid("missing debit operation"))?;
        let (recipient, received) = credit.ok_or_else(|| invalid("missing credit operation"))?;

        if sent != received {
            return Err(invalid(format!(
                "debit {} and credit {} do not balance",
                sent, received
            )));
        }

        Ok(Self {
            sender,
            recipient,
            amount: sent,
        })
    }

    /// The intent carried by a native transaction.
    pub fn from_transaction(tx: &NativeTransaction) -> Self {
        Self {
            sender: tx.sender(),
            recipient: tx.to_addr,
            amount: tx.amount,
        }
    }

    /// Addresses that must sign, in payload order.
    pub fn signers(&self) -> Vec<Address> {
        vec![self.sender]
    }

    /// Rebuilds the debit/credit pair, addresses in Bech32.
    pub fn to_operations(&self) -> Vec<Operation> {
        let debit = Operation {
            operation_identifier: OperationIdentifier::new(0),
            related_operations: None,
            operation_type: OperationType::Transfer.to_string(),
            status: None,
            account: Some(AccountIdentifier::new(self.sender.to_bech32())),
            amount: Some(Amount::zil(format!("-{}", self.amount))),
            metadata: None,
        };
        let credit = Operation {
            operation_identifier: OperationIdentifier::new(1),
            related_operations: Some(vec![OperationIdentifier::new(0)]),
            operation_type: OperationType::Transfer.to_string(),
            status: None,
            account: Some(AccountIdentifier::new(self.recipient.to_bech32())),
            amount: Some(Amount::zil(self.amount.to_string())),
            metadata: None,
        };
        vec![debit, credit]
    }
}

fn parse_transfer(op: &Operation) -> Result<(Address, i128)> {
    op.operation_type
        .parse::<OperationType>()
        .map_err(invalid)?;

    if op.status.as_deref().map_or(false, |s| !s.is_empty()) {
        return Err(invalid("operation status must not be set during construction"));
    }

    let account = op
        .account
        .as_ref()
        .ok_or_else(|| invalid("operation has no account"))?;
    let address = Address::decode(&account.address)?;

    let amount = op
        .amount
        .as_ref()
        .ok_or_else(|| invalid("operation has no amount"))?;
    if !amount.currency.is_zil() {
        return Err(invalid(format!(
            "unsupported currency {} with {} decimals",
            amount.currency.symbol, amount.currency.decimals
        )));
    }
    let value = amount
        .value
        .parse::<i128>()
        .map_err(|_| invalid(format!("amount {:?} is not an integer", amount.value)))?;
    if value == 0 {
        return Err(invalid("amount must not be zero"));
    }

    Ok((address, value))
}

fn invalid(msg: impl Into<String>) -> ConstructionError {
    ConstructionError::InvalidOperations(msg.into())
}
