use crate::{CodecError, MAX_NUM_CHUNKS};
use alloy_primitives::{b256, keccak256, B256, U256};
use c_kzg::{ethereum_kzg_settings, Blob, Bytes32};
use rollup_relayer_primitives::ChunkData;
use sha2::{Digest, Sha256};

/// The size of an EIP-4844 blob.
pub(crate) const BLOB_BYTES: usize = 131_072;

/// The usable payload of a blob: 4096 field elements of 31 bytes each.
pub(crate) const MAX_BLOB_DATA_BYTES: usize = 126_976;

/// The blob metadata: a chunk count and one payload length per chunk slot.
pub(crate) const BLOB_METADATA_BYTES: usize = 2 + 4 * MAX_NUM_CHUNKS;

/// The BLS12-381 scalar field modulus of EIP-4844.
const BLS_MODULUS: B256 =
    b256!("73eda753299d7d483339d80809a1d80553bda402fffe5bfeffffffff00000001");

const VERSIONED_HASH_VERSION_KZG: u8 = 0x01;

pub(crate) struct BlobPayload {
    /// The canonical (padded) blob contents.
    pub(crate) blob: Vec<u8>,
    /// The versioned hash of the blob commitment.
    pub(crate) versioned_hash: B256,
    /// The challenge point z derived from the payload and versioned hash.
    pub(crate) challenge_point: B256,
}

/// Packs the L2 transaction payloads of the chunks into a blob and derives
/// the proof challenge point.
pub(crate) fn construct_blob_payload(chunks: &[ChunkData]) -> Result<BlobPayload, CodecError> {
    let mut blob_bytes = vec![0u8; BLOB_METADATA_BYTES];

    // one hash for the metadata, one per chunk slot, one for the versioned hash
    let mut challenge_preimage = [0u8; (1 + MAX_NUM_CHUNKS + 1) * 32];
    let mut chunk_data_hash = B256::ZERO;

    blob_bytes[0..2].copy_from_slice(&(chunks.len() as u16).to_be_bytes());

    for (chunk_id, chunk) in chunks.iter().enumerate() {
        let chunk_start = blob_bytes.len();
        for block in &chunk.blocks {
            for tx in block.transactions.iter().filter(|tx| !tx.is_l1_message()) {
                blob_bytes.extend_from_slice(&tx.payload);
            }
        }

        let chunk_size = blob_bytes.len() - chunk_start;
        if chunk_size != 0 {
            let offset = 2 + 4 * chunk_id;
            blob_bytes[offset..offset + 4].copy_from_slice(&(chunk_size as u32).to_be_bytes());
        }

        chunk_data_hash = keccak256(&blob_bytes[chunk_start..]);
        challenge_preimage[32 * (1 + chunk_id)..32 * (2 + chunk_id)]
            .copy_from_slice(chunk_data_hash.as_slice());
    }

    // pad the unused chunk slots of the preimage with the last chunk hash
    for chunk_id in chunks.len()..MAX_NUM_CHUNKS {
        challenge_preimage[32 * (1 + chunk_id)..32 * (2 + chunk_id)]
            .copy_from_slice(chunk_data_hash.as_slice());
    }

    let metadata_hash = keccak256(&blob_bytes[..BLOB_METADATA_BYTES]);
    challenge_preimage[..32].copy_from_slice(metadata_hash.as_slice());

    let blob = make_blob_canonical(&blob_bytes)?;

    let kzg_blob = Blob::from_bytes(&blob)?;
    let commitment = ethereum_kzg_settings(0).blob_to_kzg_commitment(&kzg_blob)?;
    let mut versioned_hash: [u8; 32] = Sha256::digest(commitment.to_bytes().as_slice()).into();
    versioned_hash[0] = VERSIONED_HASH_VERSION_KZG;
    let versioned_hash = B256::from(versioned_hash);

    challenge_preimage[32 * (1 + MAX_NUM_CHUNKS)..].copy_from_slice(versioned_hash.as_slice());

    // z = keccak(preimage) mod the BLS modulus
    let challenge_digest = keccak256(challenge_preimage);
    let challenge_point = U256::from_be_bytes(challenge_digest.0)
        .reduce_mod(U256::from_be_bytes(BLS_MODULUS.0));

    Ok(BlobPayload {
        blob,
        versioned_hash,
        challenge_point: B256::from(challenge_point.to_be_bytes::<32>()),
    })
}

/// Spreads the raw payload over the canonical blob representation, one zero
/// guard byte before every 31 payload bytes so each field element stays below
/// the BLS modulus.
pub(crate) fn make_blob_canonical(blob_bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
    if blob_bytes.len() > MAX_BLOB_DATA_BYTES {
        return Err(CodecError::OversizedBlobPayload {
            size: blob_bytes.len(),
            max: MAX_BLOB_DATA_BYTES,
        });
    }

    let mut blob = vec![0u8; BLOB_BYTES];
    for (index, segment) in blob_bytes.chunks(31).enumerate() {
        let start = index * 32 + 1;
        blob[start..start + segment.len()].copy_from_slice(segment);
    }

    Ok(blob)
}

/// Computes the point-evaluation proof of the blob at z, laid out as the
/// rollup contract expects it: z, y, commitment, proof, 160 bytes packed.
pub(crate) fn point_evaluation_proof(blob_bytes: &[u8], z: B256) -> Result<Vec<u8>, CodecError> {
    let blob = Blob::from_bytes(blob_bytes)?;
    let settings = ethereum_kzg_settings(0);
    let commitment = settings.blob_to_kzg_commitment(&blob)?;
    let (proof, y) = settings.compute_kzg_proof(&blob, &Bytes32::new(z.0))?;

    let mut out = Vec::with_capacity(160);
    out.extend_from_slice(z.as_slice());
    out.extend_from_slice(y.as_slice());
    out.extend_from_slice(commitment.to_bytes().as_slice());
    out.extend_from_slice(proof.to_bytes().as_slice());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::Bytes;
    use rollup_relayer_primitives::{L2Block, TransactionData};

    fn chunk_with_payload(payload: &'static [u8]) -> ChunkData {
        ChunkData::new(vec![L2Block {
            transactions: vec![TransactionData {
                tx_type: 2,
                payload: Bytes::from_static(payload),
                ..Default::default()
            }],
            ..Default::default()
        }])
    }

    #[test]
    fn canonical_blob_keeps_every_32nd_byte_zero() {
        let blob = make_blob_canonical(&[0xff; 100]).unwrap();
        assert_eq!(blob.len(), BLOB_BYTES);
        for element in 0..4096 {
            assert_eq!(blob[element * 32], 0);
        }
        assert_eq!(&blob[1..32], &[0xff; 31]);
        assert_eq!(blob[33..64].iter().filter(|byte| **byte == 0xff).count(), 31);
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let payload = vec![1u8; MAX_BLOB_DATA_BYTES + 1];
        assert!(matches!(
            make_blob_canonical(&payload),
            Err(CodecError::OversizedBlobPayload { .. })
        ));
    }

    #[test]
    fn metadata_records_chunk_count_and_sizes() {
        let chunks = vec![chunk_with_payload(&[1, 2, 3, 4, 5]), chunk_with_payload(&[6, 7])];
        let payload = construct_blob_payload(&chunks).unwrap();

        // the first field element guard byte is zero, metadata follows
        assert_eq!(payload.blob[0], 0);
        assert_eq!(&payload.blob[1..3], &2u16.to_be_bytes());
        assert_eq!(&payload.blob[3..7], &5u32.to_be_bytes());
        assert_eq!(&payload.blob[7..11], &2u32.to_be_bytes());
        assert_eq!(payload.versioned_hash[0], VERSIONED_HASH_VERSION_KZG);
    }

    #[test]
    fn challenge_point_is_below_the_bls_modulus() {
        let chunks = vec![chunk_with_payload(&[9; 64])];
        let payload = construct_blob_payload(&chunks).unwrap();
        let z = U256::from_be_bytes(payload.challenge_point.0);
        assert!(z < U256::from_be_bytes(BLS_MODULUS.0));
    }

    #[test]
    fn point_evaluation_proof_is_160_bytes() {
        let chunks = vec![chunk_with_payload(&[3; 10])];
        let payload = construct_blob_payload(&chunks).unwrap();
        let proof = point_evaluation_proof(&payload.blob, payload.challenge_point).unwrap();
        assert_eq!(proof.len(), 160);
        assert_eq!(&proof[..32], payload.challenge_point.as_slice());
    }
}
