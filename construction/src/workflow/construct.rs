//! Stages that build an unsigned transaction: derive, preprocess, metadata
//! and payloads.

use tracing::{debug, info};

use crate::address::Address;
use crate::config::DEFAULT_GAS_LIMIT;
use crate::crypto::{SignatureType, ZilPublicKey};
use crate::error::{ConstructionError, Result};
use crate::transaction::{NativeTransaction, TransferIntent, UnsignedEnvelope};
use crate::types::{
    self, AccountIdentifier, Amount, ConstructionDeriveRequest, ConstructionDeriveResponse,
    ConstructionMetadataRequest, ConstructionMetadataResponse, ConstructionPayloadsRequest,
    ConstructionPayloadsResponse, ConstructionPreprocessRequest, ConstructionPreprocessResponse,
    Metadata, MetadataKey, PublicKey, SigningPayload,
};
use crate::workflow::{ConstructionService, RequestContext};

/// Keys whose values live in the transaction itself once payloads runs.
const TRANSACTION_KEYS: [MetadataKey; 4] = [
    MetadataKey::Nonce,
    MetadataKey::GasPrice,
    MetadataKey::GasLimit,
    MetadataKey::Data,
];

impl ConstructionService {
    /// `/construction/derive`: the address owned by a public key, encoded as
    /// the `type` metadata asks (Bech32 by default).
    pub fn derive(&self, request: ConstructionDeriveRequest) -> Result<ConstructionDeriveResponse> {
        self.check_network(&request.network_identifier)?;

        let key = parse_public_key(&request.public_key)?;
        let address_type = types::address_type(request.metadata.as_ref())?;
        let encoded = Address::from_public_key(&key).encode(address_type);
        debug!(%address_type, address = %encoded, "derived address");

        Ok(ConstructionDeriveResponse {
            address: Some(encoded.clone()),
            account_identifier: Some(AccountIdentifier::new(encoded)),
            metadata: request.metadata,
        })
    }

    /// `/construction/preprocess`: validates the operations and tells the
    /// client which account to look up and which key must sign. No lookups
    /// happen here.
    pub fn preprocess(
        &self,
        request: ConstructionPreprocessRequest,
    ) -> Result<ConstructionPreprocessResponse> {
        self.check_network(&request.network_identifier)?;

        let intent = TransferIntent::from_operations(&request.operations)?;
        let mut options = request.metadata.unwrap_or_default();
        validate_overrides(&options)?;
        types::insert_str(&mut options, MetadataKey::Sender, intent.sender.to_bech32());

        let required = intent
            .signers()
            .iter()
            .map(|signer| AccountIdentifier::new(signer.to_bech32()))
            .collect();

        debug!(sender = %intent.sender, recipient = %intent.recipient, amount = %intent.amount, "preprocessed transfer");
        Ok(ConstructionPreprocessResponse {
            options: Some(options),
            required_public_keys: Some(required),
        })
    }

    /// `/construction/metadata`: resolves nonce and gas price against the
    /// node, unless the options already pin them.
    ///
    /// The next nonce is the account's current nonce plus one. The gas limit
    /// defaults to [`DEFAULT_GAS_LIMIT`]. The suggested fee is
    /// `gas_price × gas_limit`.
    pub async fn metadata(
        &self,
        request: ConstructionMetadataRequest,
        ctx: &RequestContext,
    ) -> Result<ConstructionMetadataResponse> {
        self.check_network(&request.network_identifier)?;

        let mut metadata = request.options.unwrap_or_default();
        let sender = types::get_str(&metadata, MetadataKey::Sender)?
            .ok_or_else(|| ConstructionError::InvalidMetadata("options must name a sender".into()))
            .and_then(|s| Address::decode(s).map_err(ConstructionError::from))?;
        let (nonce, gas_price, gas_limit) = validate_overrides(&metadata)?;
        let chain = self.chain()?;

        let nonce = match nonce {
            Some(nonce) => nonce,
            None => {
                let account = ctx.run(chain.fetch_account_metadata(&sender)).await?;
                account.nonce.checked_add(1).ok_or_else(|| {
                    ConstructionError::InvalidMetadata(format!(
                        "account {} has exhausted its nonce space",
                        sender
                    ))
                })?
            }
        };
        let gas_price = match gas_price {
            Some(price) => price,
            None => ctx.run(chain.fetch_fee_estimate()).await?,
        };

        let fee = gas_price.checked_mul(gas_limit as u128).ok_or_else(|| {
            ConstructionError::InvalidMetadata(format!(
                "fee {} × {} overflows",
                gas_price, gas_limit
            ))
        })?;

        types::insert_u64(&mut metadata, MetadataKey::Nonce, nonce);
        types::insert_u128(&mut metadata, MetadataKey::GasPrice, gas_price);
        types::insert_u64(&mut metadata, MetadataKey::GasLimit, gas_limit);

        info!(sender = %sender, nonce, gas_price = %gas_price, gas_limit, "resolved construction metadata");
        Ok(ConstructionMetadataResponse {
            metadata,
            suggested_fee: Some(vec![Amount::zil(fee.to_string())]),
        })
    }

    /// `/construction/payloads`: builds the unsigned transaction and one
    /// signing payload per required signer, in signer order.
    pub fn payloads(
        &self,
        request: ConstructionPayloadsRequest,
    ) -> Result<ConstructionPayloadsResponse> {
        self.check_network(&request.network_identifier)?;

        let intent = TransferIntent::from_operations(&request.operations)?;
        let metadata = request.metadata.unwrap_or_default();
        let (nonce, gas_price, gas_limit) = validate_overrides(&metadata)?;
        let nonce = nonce.ok_or_else(|| missing(MetadataKey::Nonce))?;
        let gas_price = gas_price.ok_or_else(|| missing(MetadataKey::GasPrice))?;
        let data = types::get_str(&metadata, MetadataKey::Data)?
            .unwrap_or_default()
            .to_string();

        let pub_key = find_signer_key(request.public_keys.as_deref(), &intent.sender)?;

        let transaction = NativeTransaction {
            id: None,
            version: self.codec.version(),
            nonce,
            to_addr: intent.recipient,
            amount: intent.amount,
            pub_key,
            gas_price,
            gas_limit,
            code: String::new(),
            data,
            signature: None,
            priority: false,
        };
        let payload_hex = hex::encode(self.codec.core_bytes(&transaction)?);

        let mut passthrough = metadata;
        passthrough.retain(|k, _| !TRANSACTION_KEYS.iter().any(|key| key.as_str() == k));

        let envelope = UnsignedEnvelope {
            signers: intent.signers(),
            transaction,
            metadata: passthrough,
        };
        let payloads = envelope
            .signers
            .iter()
            .map(|signer| SigningPayload {
                address: None,
                account_identifier: Some(AccountIdentifier::new(signer.to_bech32())),
                hex_bytes: payload_hex.clone(),
                signature_type: Some(SignatureType::Schnorr1),
            })
            .collect();

        debug!(sender = %intent.sender, nonce, "built unsigned transaction");
        Ok(ConstructionPayloadsResponse {
            unsigned_transaction: envelope.encode(&self.codec)?,
            payloads,
        })
    }
}

/// Parses a client key, enforcing secp256k1.
pub(super) fn parse_public_key(key: &PublicKey) -> Result<ZilPublicKey> {
    Ok(ZilPublicKey::from_hex_with_curve(&key.hex_bytes, key.curve_type)?)
}

/// Reads and type-checks the nonce, gas price and gas limit keys. The gas
/// limit falls back to the default.
fn validate_overrides(metadata: &Metadata) -> Result<(Option<u64>, Option<u128>, u64)> {
    let nonce = types::get_u64(metadata, MetadataKey::Nonce)?;
    let gas_price = types::get_u128(metadata, MetadataKey::GasPrice)?;
    let gas_limit = types::get_u64(metadata, MetadataKey::GasLimit)?.unwrap_or(DEFAULT_GAS_LIMIT);
    if gas_limit == 0 {
        return Err(ConstructionError::InvalidMetadata(
            "gas_limit must be positive".into(),
        ));
    }
    types::get_str(metadata, MetadataKey::Data)?;
    Ok((nonce, gas_price, gas_limit))
}

fn find_signer_key(keys: Option<&[PublicKey]>, sender: &Address) -> Result<ZilPublicKey> {
    for key in keys.unwrap_or_default() {
        let parsed = parse_public_key(key)?;
        if Address::from_public_key(&parsed) == *sender {
            return Ok(parsed);
        }
    }
    Err(ConstructionError::InvalidPublicKey(format!(
        "no public key supplied for sender {}",
        sender
    )))
}

fn missing(key: MetadataKey) -> ConstructionError {
    ConstructionError::InvalidMetadata(format!("metadata is missing {}", key.as_str()))
}
