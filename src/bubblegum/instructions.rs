//! Instruction builders for tree creation and minting.

use borsh::BorshSerialize;
use sha2::{Digest, Sha256};
use solana_sdk::instruction::{AccountMeta, Instruction};
use solana_sdk::pubkey::Pubkey;
use solana_sdk::system_instruction;
use solana_sdk::system_program;

use crate::bubblegum::metadata::MetadataArgs;
use crate::bubblegum::tree::TreeParams;
use crate::bubblegum::{ACCOUNT_COMPRESSION_PROGRAM_ID, BUBBLEGUM_PROGRAM_ID, NOOP_PROGRAM_ID};

/// Anchor instruction discriminator: `sha256("global:<name>")[..8]`.
pub fn anchor_discriminator(name: &str) -> [u8; 8] {
    let digest = Sha256::digest(format!("global:{}", name).as_bytes());
    let mut out = [0u8; 8];
    out.copy_from_slice(&digest[..8]);
    out
}

/// Tree config PDA for a merkle tree.
pub fn tree_config_pda(merkle_tree: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(&[merkle_tree.as_ref()], &BUBBLEGUM_PROGRAM_ID)
}

#[derive(BorshSerialize)]
struct CreateTreeArgs {
    max_depth: u32,
    max_buffer_size: u32,
    public: Option<bool>,
}

fn instruction_data<T: BorshSerialize>(name: &str, args: &T) -> borsh::io::Result<Vec<u8>> {
    let mut data = anchor_discriminator(name).to_vec();
    args.serialize(&mut data)?;
    Ok(data)
}

/// Allocate the tree account and initialize its Bubblegum config.
///
/// `lamports` must cover rent for `params.account_size()`. Both `payer` and
/// `merkle_tree` sign; `tree_creator` becomes the tree authority.
pub fn create_tree_instructions(
    payer: &Pubkey,
    merkle_tree: &Pubkey,
    tree_creator: &Pubkey,
    params: &TreeParams,
    lamports: u64,
) -> borsh::io::Result<[Instruction; 2]> {
    let allocate = system_instruction::create_account(
        payer,
        merkle_tree,
        lamports,
        params.account_size() as u64,
        &ACCOUNT_COMPRESSION_PROGRAM_ID,
    );

    let (tree_config, _) = tree_config_pda(merkle_tree);
    let create_tree = Instruction {
        program_id: BUBBLEGUM_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(tree_config, false),
            AccountMeta::new(*merkle_tree, false),
            AccountMeta::new(*payer, true),
            AccountMeta::new_readonly(*tree_creator, true),
            AccountMeta::new_readonly(NOOP_PROGRAM_ID, false),
            AccountMeta::new_readonly(ACCOUNT_COMPRESSION_PROGRAM_ID, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: instruction_data(
            "create_tree",
            &CreateTreeArgs {
                max_depth: params.max_depth,
                max_buffer_size: params.max_buffer_size,
                public: params.public,
            },
        )?,
    };

    Ok([allocate, create_tree])
}

/// Mint one compressed NFT into `merkle_tree`, owned by `leaf_owner`.
///
/// The leaf delegate defaults to the owner.
pub fn mint_v1_instruction(
    merkle_tree: &Pubkey,
    leaf_owner: &Pubkey,
    leaf_delegate: Option<&Pubkey>,
    payer: &Pubkey,
    tree_creator_or_delegate: &Pubkey,
    metadata: &MetadataArgs,
) -> borsh::io::Result<Instruction> {
    let (tree_config, _) = tree_config_pda(merkle_tree);
    let leaf_delegate = leaf_delegate.unwrap_or(leaf_owner);

    Ok(Instruction {
        program_id: BUBBLEGUM_PROGRAM_ID,
        accounts: vec![
            AccountMeta::new(tree_config, false),
            AccountMeta::new_readonly(*leaf_owner, false),
            AccountMeta::new_readonly(*leaf_delegate, false),
            AccountMeta::new(*merkle_tree, false),
            AccountMeta::new_readonly(*payer, true),
            AccountMeta::new_readonly(*tree_creator_or_delegate, true),
            AccountMeta::new_readonly(NOOP_PROGRAM_ID, false),
            AccountMeta::new_readonly(ACCOUNT_COMPRESSION_PROGRAM_ID, false),
            AccountMeta::new_readonly(system_program::ID, false),
        ],
        data: instruction_data("mint_v1", metadata)?,
    })
}
