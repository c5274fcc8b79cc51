use embedded_storage::{ReadStorage, Storage};
use esp_bootloader_esp_idf::partitions::{
    DataPartitionSubType, PARTITION_TABLE_MAX_LEN, PartitionType, read_partition_table,
};
use esp_rom_sys::rom::spiflash::{
    ESP_ROM_SPIFLASH_RESULT_OK, esp_rom_spiflash_erase_sector, esp_rom_spiflash_read,
    esp_rom_spiflash_unlock, esp_rom_spiflash_write,
};
use lifeline_core::provisioning::{
    CredentialStore, PASSWORD_BYTES, SSID_BYTES, WifiCredentials,
};
use log::debug;

const FLASH_SECTOR_SIZE: u32 = 4096;
const DEFAULT_FLASH_CAPACITY_BYTES: usize = 16 * 1024 * 1024;

const RECORD_MAGIC: u32 = 0x3157_4C4C; // "LLW1"
const RECORD_VERSION: u8 = 1;
// magic(4) version(1) ssid_len(1) password_len(1) reserved(1)
const RECORD_HEADER_LEN: usize = 8;
const RECORD_PAYLOAD_LEN: usize = SSID_BYTES + PASSWORD_BYTES;
const RECORD_CHECKSUM_AT: usize = RECORD_HEADER_LEN + RECORD_PAYLOAD_LEN;
const RECORD_LEN: usize = RECORD_CHECKSUM_AT + 4;

#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum FlashCredentialsError {
    PartitionTable,
    PartitionMissing,
    PartitionTooSmall,
    FlashOpFailed(i32),
    Corrupted,
    Unsupported,
}

/// Word-granular access to the SPI flash through the ROM routines.
#[derive(Debug)]
struct RawFlash;

impl RawFlash {
    fn new() -> Result<Self, FlashCredentialsError> {
        let rc = unsafe { esp_rom_spiflash_unlock() };
        if rc != ESP_ROM_SPIFLASH_RESULT_OK {
            return Err(FlashCredentialsError::FlashOpFailed(rc));
        }
        Ok(Self)
    }

    fn erase_sector(&mut self, sector_addr: u32) -> Result<(), FlashCredentialsError> {
        if !sector_addr.is_multiple_of(FLASH_SECTOR_SIZE) {
            return Err(FlashCredentialsError::Unsupported);
        }

        let rc = unsafe { esp_rom_spiflash_erase_sector(sector_addr / FLASH_SECTOR_SIZE) };
        if rc != ESP_ROM_SPIFLASH_RESULT_OK {
            return Err(FlashCredentialsError::FlashOpFailed(rc));
        }
        Ok(())
    }

    fn read_word(&mut self, addr: u32) -> Result<u32, FlashCredentialsError> {
        if !addr.is_multiple_of(4) {
            return Err(FlashCredentialsError::Unsupported);
        }

        let mut word = 0u32;
        let rc = unsafe { esp_rom_spiflash_read(addr, &mut word as *mut u32 as *const u32, 4) };
        if rc != ESP_ROM_SPIFLASH_RESULT_OK {
            return Err(FlashCredentialsError::FlashOpFailed(rc));
        }
        Ok(word)
    }

    fn write_word(&mut self, addr: u32, word: u32) -> Result<(), FlashCredentialsError> {
        if !addr.is_multiple_of(4) {
            return Err(FlashCredentialsError::Unsupported);
        }

        let rc = unsafe { esp_rom_spiflash_write(addr, &word as *const u32, 4) };
        if rc != ESP_ROM_SPIFLASH_RESULT_OK {
            return Err(FlashCredentialsError::FlashOpFailed(rc));
        }
        Ok(())
    }

    /// Callers keep `addr` word-aligned; records always start on a sector.
    fn read_aligned(&mut self, addr: u32, out: &mut [u8]) -> Result<(), FlashCredentialsError> {
        if !addr.is_multiple_of(4) {
            return Err(FlashCredentialsError::Unsupported);
        }

        for (i, chunk) in out.chunks_mut(4).enumerate() {
            let word = self.read_word(addr + (i as u32) * 4)?.to_le_bytes();
            chunk.copy_from_slice(&word[..chunk.len()]);
        }
        Ok(())
    }

    /// Writes into freshly erased flash; a short tail word is padded with 0xFF.
    fn write_aligned(&mut self, addr: u32, data: &[u8]) -> Result<(), FlashCredentialsError> {
        if !addr.is_multiple_of(4) {
            return Err(FlashCredentialsError::Unsupported);
        }

        for (i, chunk) in data.chunks(4).enumerate() {
            let mut bytes = [0xFFu8; 4];
            bytes[..chunk.len()].copy_from_slice(chunk);
            self.write_word(addr + (i as u32) * 4, u32::from_le_bytes(bytes))?;
        }
        Ok(())
    }
}

impl ReadStorage for RawFlash {
    type Error = FlashCredentialsError;

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        self.read_aligned(offset, bytes)
    }

    fn capacity(&self) -> usize {
        DEFAULT_FLASH_CAPACITY_BYTES
    }
}

// Only the partition table reader goes through embedded-storage, and it
// never writes.
impl Storage for RawFlash {
    fn write(&mut self, _offset: u32, _bytes: &[u8]) -> Result<(), Self::Error> {
        Err(FlashCredentialsError::Unsupported)
    }
}

/// WiFi credentials kept in the last sector of the first writable data
/// partition (an undefined-subtype data partition wins over NVS).
#[derive(Debug)]
pub struct FlashCredentialStore {
    flash: RawFlash,
    record_addr: u32,
}

impl FlashCredentialStore {
    pub fn new() -> Result<Self, FlashCredentialsError> {
        let mut flash = RawFlash::new()?;

        let mut table_buf = [0u8; PARTITION_TABLE_MAX_LEN];
        let table = read_partition_table(&mut flash, &mut table_buf)
            .map_err(|_| FlashCredentialsError::PartitionTable)?;

        let mut data_undefined: Option<(u32, u32)> = None;
        let mut fallback_nvs: Option<(u32, u32)> = None;

        for entry in table.iter() {
            if entry.is_read_only() || entry.len() < FLASH_SECTOR_SIZE {
                continue;
            }

            match entry.partition_type() {
                PartitionType::Data(DataPartitionSubType::Undefined) => {
                    data_undefined = Some((entry.offset(), entry.len()));
                    break;
                }
                PartitionType::Data(DataPartitionSubType::Nvs) if fallback_nvs.is_none() => {
                    fallback_nvs = Some((entry.offset(), entry.len()));
                }
                _ => {}
            }
        }

        let (offset, len) = data_undefined
            .or(fallback_nvs)
            .ok_or(FlashCredentialsError::PartitionMissing)?;

        if len < FLASH_SECTOR_SIZE {
            return Err(FlashCredentialsError::PartitionTooSmall);
        }

        let record_addr = offset + len - FLASH_SECTOR_SIZE;
        debug!("storage: credentials sector at {:#x}", record_addr);
        Ok(Self { flash, record_addr })
    }
}

impl CredentialStore for FlashCredentialStore {
    type Error = FlashCredentialsError;

    fn load(&mut self) -> Result<Option<WifiCredentials>, Self::Error> {
        let mut buf = [0u8; RECORD_LEN];
        self.flash.read_aligned(self.record_addr, &mut buf)?;
        decode_record(&buf)
    }

    fn save(&mut self, credentials: &WifiCredentials) -> Result<(), Self::Error> {
        let buf = encode_record(credentials);
        self.flash.erase_sector(self.record_addr)?;
        self.flash.write_aligned(self.record_addr, &buf)
    }
}

fn encode_record(credentials: &WifiCredentials) -> [u8; RECORD_LEN] {
    let ssid = credentials.ssid.as_bytes();
    let password = credentials.password.as_bytes();

    let mut buf = [0u8; RECORD_LEN];
    buf[0..4].copy_from_slice(&RECORD_MAGIC.to_le_bytes());
    buf[4] = RECORD_VERSION;
    buf[5] = ssid.len() as u8;
    buf[6] = password.len() as u8;
    buf[RECORD_HEADER_LEN..RECORD_HEADER_LEN + ssid.len()].copy_from_slice(ssid);
    let password_at = RECORD_HEADER_LEN + SSID_BYTES;
    buf[password_at..password_at + password.len()].copy_from_slice(password);

    let checksum = checksum32(&buf[..RECORD_CHECKSUM_AT]);
    buf[RECORD_CHECKSUM_AT..].copy_from_slice(&checksum.to_le_bytes());
    buf
}

fn decode_record(buf: &[u8; RECORD_LEN]) -> Result<Option<WifiCredentials>, FlashCredentialsError> {
    if buf.iter().all(|b| *b == 0xFF) {
        return Ok(None);
    }

    let magic = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if magic != RECORD_MAGIC || buf[4] != RECORD_VERSION {
        return Ok(None);
    }

    let expected = u32::from_le_bytes([
        buf[RECORD_CHECKSUM_AT],
        buf[RECORD_CHECKSUM_AT + 1],
        buf[RECORD_CHECKSUM_AT + 2],
        buf[RECORD_CHECKSUM_AT + 3],
    ]);
    if checksum32(&buf[..RECORD_CHECKSUM_AT]) != expected {
        return Err(FlashCredentialsError::Corrupted);
    }

    let ssid_len = buf[5] as usize;
    let password_len = buf[6] as usize;
    if ssid_len == 0 || ssid_len > SSID_BYTES || password_len > PASSWORD_BYTES {
        return Err(FlashCredentialsError::Corrupted);
    }

    let ssid = core::str::from_utf8(&buf[RECORD_HEADER_LEN..RECORD_HEADER_LEN + ssid_len])
        .map_err(|_| FlashCredentialsError::Corrupted)?;
    let password_at = RECORD_HEADER_LEN + SSID_BYTES;
    let password = core::str::from_utf8(&buf[password_at..password_at + password_len])
        .map_err(|_| FlashCredentialsError::Corrupted)?;

    WifiCredentials::new(ssid, password)
        .map(Some)
        .map_err(|_| FlashCredentialsError::Corrupted)
}

fn checksum32(bytes: &[u8]) -> u32 {
    let mut hash = 0x811C9DC5u32;
    for b in bytes {
        hash ^= *b as u32;
        hash = hash.wrapping_mul(16777619);
    }
    hash
}
