//! Stages that inspect, sign and submit: parse, combine, hash and submit.

use serde_json::Value;
use tracing::{debug, info, warn};

use crate::address::Address;
use crate::config::SIGNATURE_LENGTH;
use crate::crypto::SignatureType;
use crate::error::{ConstructionError, Result};
use crate::mempool::{Acceptance, SubmissionSink};
use crate::transaction::{NativeTransaction, TransferIntent, UnsignedEnvelope};
use crate::types::{
    self, AccountIdentifier, ConstructionCombineRequest, ConstructionCombineResponse,
    ConstructionHashRequest, ConstructionParseRequest, ConstructionParseResponse,
    ConstructionSubmitRequest, Metadata, MetadataKey, Signature, TransactionIdentifier,
    TransactionIdentifierResponse,
};
use crate::workflow::construct::parse_public_key;
use crate::workflow::{ConstructionService, RequestContext};

impl ConstructionService {
    /// `/construction/parse`: recovers the operations from either the
    /// unsigned envelope or a signed native payload, and reports which form
    /// it found. Signers are listed for the signed form only.
    pub fn parse(&self, request: ConstructionParseRequest) -> Result<ConstructionParseResponse> {
        self.check_network(&request.network_identifier)?;

        let value: Value = serde_json::from_str(&request.transaction).map_err(|e| {
            ConstructionError::MalformedTransaction(format!("invalid json: {}", e))
        })?;

        let (transaction, mut metadata) = if UnsignedEnvelope::is_envelope(&value) {
            let envelope = UnsignedEnvelope::from_value(&self.codec, value)?;
            (envelope.transaction, envelope.metadata)
        } else {
            (self.codec.parse_value(value)?, Metadata::new())
        };

        let signed = transaction.is_signed();
        if signed != request.signed {
            return Err(ConstructionError::MalformedTransaction(format!(
                "request says signed={} but the transaction is {}",
                request.signed,
                if signed { "signed" } else { "unsigned" }
            )));
        }

        types::insert_u64(&mut metadata, MetadataKey::Nonce, transaction.nonce);
        types::insert_u128(&mut metadata, MetadataKey::GasPrice, transaction.gas_price);
        types::insert_u64(&mut metadata, MetadataKey::GasLimit, transaction.gas_limit);
        if !transaction.data.is_empty() {
            types::insert_str(&mut metadata, MetadataKey::Data, transaction.data.clone());
        }

        let signers = signed.then(|| vec![AccountIdentifier::new(transaction.sender().to_bech32())]);
        debug!(signed, nonce = transaction.nonce, "parsed transaction");

        Ok(ConstructionParseResponse {
            operations: TransferIntent::from_transaction(&transaction).to_operations(),
            account_identifier_signers: signers,
            signed,
            metadata: Some(metadata),
        })
    }

    /// `/construction/combine`: attaches the client's signatures to the
    /// unsigned envelope and returns the signed native payload.
    ///
    /// Exactly one signature per listed signer is required. Each must be a
    /// 64-byte `schnorr_1` signature over the envelope's payload bytes, made
    /// by the transaction's key.
    pub fn combine(
        &self,
        request: ConstructionCombineRequest,
    ) -> Result<ConstructionCombineResponse> {
        self.check_network(&request.network_identifier)?;

        let envelope = UnsignedEnvelope::decode(&self.codec, &request.unsigned_transaction)?;
        if request.signatures.len() != envelope.signers.len() {
            warn!(
                expected = envelope.signers.len(),
                got = request.signatures.len(),
                "signature count mismatch"
            );
            return Err(ConstructionError::SignatureCountMismatch {
                expected: envelope.signers.len(),
                got: request.signatures.len(),
            });
        }

        let mut transaction = envelope.transaction;
        let sender = transaction.sender();
        if let Some(stranger) = envelope.signers.iter().find(|s| **s != sender) {
            return Err(ConstructionError::MalformedTransaction(format!(
                "signer {} is not the transaction sender {}",
                stranger, sender
            )));
        }

        let payload = self.codec.core_bytes(&transaction)?;
        let mut used = vec![false; request.signatures.len()];
        let mut sender_signature = None;

        for signer in &envelope.signers {
            let position = find_signature(&request.signatures, &used, signer)?.ok_or_else(|| {
                ConstructionError::InvalidSignature(format!("no signature for signer {}", signer))
            })?;
            used[position] = true;

            let bytes = verify_signature(&request.signatures[position], &payload, &transaction)?;
            sender_signature = Some(bytes);
        }

        transaction.signature = sender_signature;
        let signed = self.codec.serialize(&transaction)?;
        let signed_transaction = String::from_utf8(signed).map_err(|e| {
            ConstructionError::MalformedTransaction(format!("serialized form is not utf-8: {}", e))
        })?;

        debug!(sender = %sender, nonce = transaction.nonce, "combined signed transaction");
        Ok(ConstructionCombineResponse { signed_transaction })
    }

    /// `/construction/hash`: the id a signed transaction will have.
    pub fn hash(&self, request: ConstructionHashRequest) -> Result<TransactionIdentifierResponse> {
        self.check_network(&request.network_identifier)?;

        let transaction = self.codec.parse(request.signed_transaction.as_bytes())?;
        let hash = self.codec.hash(&transaction)?;

        Ok(TransactionIdentifierResponse {
            transaction_identifier: TransactionIdentifier { hash },
            metadata: None,
        })
    }

    /// `/construction/submit`: registers a signed transaction with the
    /// submission sink and, when enabled, broadcasts it to the node.
    ///
    /// Resubmitting a known transaction returns the same hash with status
    /// `duplicate` and broadcasts nothing. With broadcasting on, the hash is
    /// only reserved until the node answers: a concurrent resubmit gets a
    /// retriable rejection instead of `duplicate`, and a failed or abandoned
    /// broadcast releases the reservation so a retry starts clean.
    pub async fn submit(
        &self,
        request: ConstructionSubmitRequest,
        ctx: &RequestContext,
    ) -> Result<TransactionIdentifierResponse> {
        self.check_network(&request.network_identifier)?;

        if request.signed_transaction.trim().is_empty() {
            return Err(ConstructionError::EmptySignedTransaction);
        }

        let mut transaction = self.codec.parse(request.signed_transaction.as_bytes())?;
        if !transaction.is_signed() {
            return Err(ConstructionError::InvalidSignature(
                "submitted transaction carries no signature".into(),
            ));
        }

        let hash = self.codec.hash(&transaction)?;
        if let Some(declared) = transaction.id.as_deref() {
            if !declared.eq_ignore_ascii_case(&hash) {
                warn!(declared, computed = %hash, "declared transaction id does not match content");
                return Err(ConstructionError::HashMismatch {
                    declared: declared.to_string(),
                    computed: hash,
                });
            }
        }
        transaction.id = Some(hash.clone());

        let chain = if self.broadcast {
            Some(self.chain()?)
        } else {
            None
        };

        let registered = match chain {
            Some(_) => self.sink.reserve(&transaction),
            None => self.sink.accept(&transaction),
        };
        let acceptance = registered.map_err(|e| {
            warn!(hash = %hash, error = %e, "submission sink rejected transaction");
            ConstructionError::from(e)
        })?;

        if let (Acceptance::Accepted, Some(chain)) = (acceptance, chain) {
            let reservation = Reservation::new(self.sink.as_ref(), &hash);
            let blob = self.codec.serialize(&NativeTransaction {
                id: None,
                ..transaction
            })?;
            match ctx.run(chain.broadcast(&blob)).await {
                Ok(receipt) => {
                    if !receipt.transaction_id.eq_ignore_ascii_case(&hash) {
                        warn!(hash = %hash, node_id = %receipt.transaction_id, "node reported a different transaction id");
                    }
                    reservation.confirm();
                    info!(hash = %hash, info = ?receipt.info, "transaction broadcast");
                }
                Err(e) => {
                    drop(reservation);
                    warn!(hash = %hash, error = %e, "broadcast failed, released from sink");
                    return Err(e.into());
                }
            }
        }

        info!(hash = %hash, status = acceptance.as_str(), "transaction submitted");
        let mut metadata = Metadata::new();
        types::insert_str(&mut metadata, MetadataKey::Status, acceptance.as_str());

        Ok(TransactionIdentifierResponse {
            transaction_identifier: TransactionIdentifier { hash },
            metadata: Some(metadata),
        })
    }
}

/// A hash reserved in the sink while its broadcast runs. Released on drop
/// unless confirmed, which also covers a submit future dropped mid-await.
struct Reservation<'a> {
    sink: &'a dyn SubmissionSink,
    hash: &'a str,
    settled: bool,
}

impl<'a> Reservation<'a> {
    fn new(sink: &'a dyn SubmissionSink, hash: &'a str) -> Self {
        Self {
            sink,
            hash,
            settled: false,
        }
    }

    fn confirm(mut self) {
        self.settled = true;
        if !self.sink.confirm(self.hash) {
            warn!(hash = %self.hash, "reservation vanished before broadcast was confirmed");
        }
    }
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.sink.release(self.hash);
        }
    }
}

/// Index of the unused signature that belongs to `signer`, judged by the
/// payload's account or, failing that, by the signing key.
fn find_signature(
    signatures: &[Signature],
    used: &[bool],
    signer: &Address,
) -> Result<Option<usize>> {
    for (i, signature) in signatures.iter().enumerate() {
        if used[i] {
            continue;
        }
        let owner = match signature.signing_payload.signer_address() {
            Some(address) => Address::decode(address)?,
            None => Address::from_public_key(&parse_public_key(&signature.public_key)?),
        };
        if owner == *signer {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

/// Checks one signature against the payload and the transaction key and
/// returns its bytes.
fn verify_signature(
    signature: &Signature,
    payload: &[u8],
    transaction: &NativeTransaction,
) -> Result<[u8; SIGNATURE_LENGTH]> {
    let invalid = |msg: String| ConstructionError::InvalidSignature(msg);

    if signature.signature_type != SignatureType::Schnorr1 {
        return Err(invalid(format!(
            "signature type {} is not supported, expected schnorr_1",
            signature.signature_type
        )));
    }
    if let Some(declared) = signature.signing_payload.signature_type {
        if declared != SignatureType::Schnorr1 {
            return Err(invalid(format!("signing payload declares {}", declared)));
        }
    }

    let signed_bytes = hex::decode(strip_0x(&signature.signing_payload.hex_bytes))
        .map_err(|_| invalid("signing payload is not hex".into()))?;
    if signed_bytes != payload {
        return Err(invalid(
            "signature was made over different bytes than this transaction".into(),
        ));
    }

    let key = parse_public_key(&signature.public_key)?;
    if key != transaction.pub_key {
        return Err(invalid(
            "signature public key does not match the transaction sender key".into(),
        ));
    }

    let bytes = hex::decode(strip_0x(&signature.hex_bytes))
        .map_err(|_| invalid("signature is not hex".into()))?;
    <[u8; SIGNATURE_LENGTH]>::try_from(bytes.as_slice()).map_err(|_| {
        invalid(format!(
            "signature must be {} bytes, got {}",
            SIGNATURE_LENGTH,
            bytes.len()
        ))
    })
}

fn strip_0x(s: &str) -> &str {
    s.strip_prefix("0x").unwrap_or(s)
}
