//! EEPROM driver integration tests against the mock adapter

use std::sync::Arc;

use uridiag::{
    device::{self, Device},
    diag,
    eeprom::{UserBlock, EEPROM_LEN, OFF_CHECKSUM, OFF_MAGIC, OFF_SPARE, USER_MAGIC, USER_START},
    mfg::CM119B_MFG_TABLE,
    transport::mock::MockAdapter,
    DiagError, ProtocolError, UriDiag,
};

fn setup(device: &'static Device) -> (Arc<MockAdapter>, UriDiag) {
    let adapter = Arc::new(MockAdapter::new(device));
    let diag = UriDiag::new(adapter.clone(), device);
    (adapter, diag)
}

#[tokio::test]
async fn word_roundtrip_over_the_full_address_space() {
    let (_adapter, diag) = setup(&device::C119B);

    // the manufacturer path covers the reserved range...
    diag.write_manufacturer_block().await.unwrap();
    // ...and the user path covers the rest
    for addr in USER_START..EEPROM_LEN as u8 {
        diag.client
            .write_word(addr, 0x1100 | addr as u16)
            .await
            .unwrap();
    }

    for addr in 0..USER_START {
        assert_eq!(
            diag.client.read_word(addr).await.unwrap(),
            CM119B_MFG_TABLE[addr as usize]
        );
    }
    for addr in USER_START..EEPROM_LEN as u8 {
        assert_eq!(
            diag.client.read_word(addr).await.unwrap(),
            0x1100 | addr as u16
        );
    }
}

#[tokio::test]
async fn user_block_checksum_and_magic() {
    let (_adapter, diag) = setup(&device::C108);

    let mut block = UserBlock::default();
    // caller-supplied magic must be ignored
    block.words[OFF_MAGIC] = 0xbeef;
    block.words[1] = 17;
    block.set_rxvoiceadj(0.810_5);
    block.words[OFF_SPARE] = 0x1234;

    let written = diag.client.write_user_block(&block).await.unwrap();
    assert_eq!(written.magic(), USER_MAGIC);

    let (read, residue) = diag.client.read_user_block().await.unwrap();
    assert_eq!(residue, 0);
    assert_eq!(read, written);
    assert_eq!(read.rxvoiceadj(), 0.810_5);
    read.validate().unwrap();
}

#[tokio::test]
async fn init_then_verify() {
    let (_adapter, diag) = setup(&device::C108);

    diag.client.init_user_block().await.unwrap();
    let block = diag.verify_user_block().await.unwrap();
    assert_eq!(block.magic(), USER_MAGIC);
    assert_eq!(block.rxmixerset(), 0);
    assert_eq!(block.spare(), 0);
}

#[tokio::test]
async fn verify_flags_blank_and_corrupt_blocks() {
    let (adapter, diag) = setup(&device::C108);

    // a blank eeprom leaves the seed as the residue
    match diag.verify_user_block().await {
        Err(DiagError::Protocol(ProtocolError::BadChecksum { residue })) => {
            assert_eq!(residue, 0xffff)
        }
        other => panic!("expected a checksum failure, got {:?}", other),
    }

    // flip a word under a valid block
    diag.client.init_user_block().await.unwrap();
    adapter.set_eeprom(USER_START + 1, 0x0100);
    assert!(matches!(
        diag.verify_user_block().await,
        Err(DiagError::Protocol(ProtocolError::BadChecksum { .. }))
    ));

    // right checksum, wrong magic
    diag.client.init_user_block().await.unwrap();
    let words = adapter.eeprom();
    let checksum = words[USER_START as usize + OFF_CHECKSUM];
    adapter.set_eeprom(USER_START, 0);
    adapter.set_eeprom(
        USER_START + OFF_CHECKSUM as u8,
        checksum.wrapping_add(USER_MAGIC),
    );
    assert!(matches!(
        diag.verify_user_block().await,
        Err(DiagError::Protocol(ProtocolError::BadMagic { got: 0, .. }))
    ));
}

#[tokio::test]
async fn manufacturer_block_end_to_end() {
    let (_adapter, diag) = setup(&device::C119B);

    diag.write_manufacturer_block().await.unwrap();

    let dump = diag.client.dump_eeprom().await.unwrap();
    assert_eq!(&dump[..CM119B_MFG_TABLE.len()], &CM119B_MFG_TABLE[..]);

    let info = diag
        .read_manufacturer_info()
        .await
        .unwrap()
        .expect("block was just programmed");
    assert_eq!(info.product.unwrap().text, "USB Audio Device");
    assert_eq!(info.pid, 0x0013);
}

#[tokio::test]
async fn manufacturer_block_guarded_by_variant() {
    let (adapter, diag) = setup(&device::C108);

    assert!(matches!(
        diag.write_manufacturer_block().await,
        Err(DiagError::UnsupportedOperation)
    ));
    assert_eq!(adapter.eeprom(), [0u16; EEPROM_LEN]);
}

#[tokio::test]
async fn eeprom_sequencer() {
    let _ = env_logger::builder().is_test(true).try_init();
    let (adapter, diag) = setup(&device::C108);

    let report = diag::eeprom_test(&diag).await;
    assert!(report.passed());
    assert_eq!(report.read, Some(diag::EEPROM_TEST_SENTINEL));
    assert_eq!(
        adapter.eeprom()[USER_START as usize + OFF_SPARE],
        diag::EEPROM_TEST_SENTINEL
    );

    // a dead transport is reported, not fatal
    adapter.fail_transfers(2);
    let report = diag::eeprom_test(&diag).await;
    assert!(!report.passed());
}
