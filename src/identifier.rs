/// Syntactic gates for the two identifier kinds the gateway accepts
///
/// Content identifiers are base58btc-encoded multihashes (`Qm...`), DIDs are
/// anything under the `did:` scheme. Deeper validity (does the content exist,
/// is the DID document well signed) belongs to the storage collaborator.
use multihash::Multihash;
use multihash_codetable::Code;

/// URI scheme prefix shared by every DID
pub const DID_PREFIX: &str = "did:";

/// Largest digest any supported hash function produces
const MAX_DIGEST_SIZE: usize = 64;

/// True iff `s` decodes as a multihash with a known hash code and a digest
/// of exactly the declared length
pub fn is_content_identifier(s: &str) -> bool {
    if s.is_empty() {
        return false;
    }

    let bytes = match bs58::decode(s).into_vec() {
        Ok(bytes) => bytes,
        Err(_) => return false,
    };

    // from_bytes rejects trailing bytes and length mismatches
    match Multihash::<MAX_DIGEST_SIZE>::from_bytes(&bytes) {
        Ok(mh) => Code::try_from(mh.code()).is_ok() && mh.size() > 0,
        Err(_) => false,
    }
}

/// True iff `s` is a non-empty string under the `did:` scheme
pub fn is_did_identifier(s: &str) -> bool {
    s.starts_with(DID_PREFIX)
}
