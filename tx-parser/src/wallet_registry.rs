//! Static registry of watched wallets and their display labels.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ParserError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalletCategory {
    Kol,
    Whale,
    Dlmm,
    Trader,
    Other,
    Meme,
}

impl WalletCategory {
    pub fn as_str(&self) -> &str {
        match self {
            WalletCategory::Kol => "kol",
            WalletCategory::Whale => "whale",
            WalletCategory::Dlmm => "dlmm",
            WalletCategory::Trader => "trader",
            WalletCategory::Other => "other",
            WalletCategory::Meme => "meme",
        }
    }

    pub fn glyph(&self) -> &str {
        match self {
            WalletCategory::Kol => "🎤",
            WalletCategory::Whale => "🐋",
            WalletCategory::Dlmm => "💧",
            WalletCategory::Trader => "📈",
            WalletCategory::Other => "👛",
            WalletCategory::Meme => "meme",
        }
    }
}

/// Category selector for the watched-wallet set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletSelection {
    All,
    Category(WalletCategory),
}

impl FromStr for WalletSelection {
    type Err = ParserError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let category = match s.trim().to_ascii_lowercase().as_str() {
            "all" => return Ok(WalletSelection::All),
            "kol" => WalletCategory::Kol,
            "whale" => WalletCategory::Whale,
            "dlmm" => WalletCategory::Dlmm,
            "trader" => WalletCategory::Trader,
            "other" => WalletCategory::Other,
            "meme" => WalletCategory::Meme,
            _ => {
                return Err(ParserError::InvalidConfig {
                    key: "WALLET_CATEGORY".to_string(),
                    value: s.to_string(),
                })
            }
        };
        Ok(WalletSelection::Category(category))
    }
}

impl fmt::Display for WalletSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WalletSelection::All => write!(f, "all"),
            WalletSelection::Category(category) => write!(f, "{}", category.as_str()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletInfo {
    pub label: String,
    pub category: WalletCategory,
}

const WALLET_REGISTRY: &[(&str, &str, WalletCategory)] = &[
    ("AVAZvHLR2PcWpDf8BXY4rVxNHYRBytycHkcB5z5QNXYm", "Ansem", WalletCategory::Kol),
    ("2DUVNBj1nsuCjmBquMoomXoTZJU4qZ8BR87J8ekuZZgd", "met", WalletCategory::Kol),
    ("9yYya3F5EJoLnBNKW6z4bZvyQytMXzDcpU5D6yYr4jqL", "KOL-3", WalletCategory::Kol),
    ("GAH2TKPtu7HSpbCkBMANPCDBSSaRFeSwoScfFRVF7oHa", "KOL-4", WalletCategory::Kol),
    ("3kebnKw7cPdSkLRfiMEALyZJGZ4wdiSRvmoN4rD1yPzV", "KOL-5", WalletCategory::Kol),
    ("BtMBMPkoNbnLF9Xn552guQq528KKXcsNBNNBre3oaQtr", "KOL-6", WalletCategory::Kol),
    ("mW4PZB45isHmnjGkLpJvjKBzVS5NXzTJ8UDyug4gTsM", "igndex", WalletCategory::Kol),
    ("DzeSE8ZBNk36qqswcDxd8919evdH5upwyZ4u1yieQSkp", "KOL-8", WalletCategory::Kol),
    ("D6kLPZVdqqBw3np76Fg2xjA9JUwbsf6wPso1XkMV2mjy", "Whale-1", WalletCategory::Whale),
    ("9XxSUjAdCNy4Nbkm1BoWWEQk7A25YhC2CyGgYyp8HLsN", "Whale-2", WalletCategory::Whale),
    ("EnQLCLB7NWojruXXNopgH7jhkwoHihTpuzsrtsM2UCSe", "Whale-3", WalletCategory::Whale),
    ("EMSA63313xrhW3y1pooBDe51a1Vw5N2PpNw3hEmvG3Xg", "EMSA", WalletCategory::Whale),
    ("7nJSDa8nnBk6UXxJhRwSo7kFo3LnNMdbvVjPTmjTQkJG", "Whale-4", WalletCategory::Whale),
    ("68huFCtdyRKvZWrxLn2vohVrCha26S3UWUH8jaKG4YZ3", "Whale-5", WalletCategory::Whale),
    ("CcvvkyXwt8Vdr8C1dxRNTHTPzziuGcnf7i8AyAabpwrK", "Whale-6", WalletCategory::Whale),
    ("Fs7zZP3SnTfRTJxwbGCGuHWBQTKTRoJg8TpZTcALV7Q6", "Whale-7", WalletCategory::Whale),
    ("DBzjnFwh9AtxE7xXbA2PRoQzas37tPbcwQ3pchW1igNq", "Whale-8", WalletCategory::Whale),
    ("H3iAMzJQnstJaWD7XALtbJ6EHdZhFd4bwv9TJySmdkFs", "Whale-9", WalletCategory::Whale),
    ("H3b4acRdAGaspYs12sXHcnDmoUX9sb2ruEtc1PMksoLo", "Whale-10", WalletCategory::Whale),
    ("ARSdp5MFL1bjgWddK8dkF3QdttHvy5ZdVjJ6T8BHJimo", "Whale-11", WalletCategory::Whale),
    ("4HjGze3GXy8aWzWeuR5hFZP6ezqRb3yhLbQULhefzQdN", "Whale-12", WalletCategory::Whale),
    ("GeNH2iCTp3sQZjudjwDC5ZC3aGGMXLWBgTGwCJyXzbMf", "Whale-13", WalletCategory::Whale),
    ("HQks83EYr56oYio2mxgRsifm35bUgS53ZacYxP7H5XEd", "Whale-14", WalletCategory::Whale),
    ("8deJ9xeUvXSJwicYptA9mHsU2rN2pDx37KWzkDkEXhU6", "CookerFlips", WalletCategory::Whale),
    ("6ykoioDZEcC9Rk1vexd2F49KDHzP63nHh21Hm4CqrWtx", "Whale-15", WalletCategory::Whale),
    ("9E9PZMYZ4jed43bvyMBy2qamCf3PmLAfREJw4ueYbvmb", "Whale-16", WalletCategory::Whale),
    ("GHWLvfyVwmF7TmyVds8guPwsmeVNXnBc8qoJxmG4dLox", "Whale-17", WalletCategory::Whale),
    ("73VhgAEtU7yUVURoSHp2AJVRvup1PeLSZSH5KFWzj46Y", "Meme-1", WalletCategory::Meme),
    ("63oQYEauMBFyaGQ69CNkwXFzCvdkFxdPaxGKYx72Tedb", "Meme-2", WalletCategory::Meme),
    ("7YjN5zV8iWKpG9cA6HyvrTWvgnfB3pEkADJAPq6DgXKv", "Meme-3", WalletCategory::Meme),
    ("76ZUBj1JLz7arTVHSRJok5oSTEqDuVBgySFMVHtzxzZc", "Meme-4", WalletCategory::Meme),
    ("ETgoSUwLhvRxmQzQg8PYMfnNiiHpXh5qojnAGms1kXu1", "Meme-5", WalletCategory::Meme),
    ("946Rx9X6et5DNZy5t6ncsmDodXLaU2s3vp8UfZHXHx2R", "Meme-6", WalletCategory::Meme),
    ("65tPpgEhTNMDe6xwqbWqxxHx7zHRQnTTHTyTbWpQKJFD", "DLMM-1", WalletCategory::Dlmm),
    ("5ZPczDuywV5GFwG6KnHjbj2eap9BBQZeyUUDwaFhRRmn", "DLMM-2", WalletCategory::Dlmm),
    ("7iNJ7CLNT8UBPANxkkrsURjzaktbomCVa93N1sKcVo9C", "jan_sol", WalletCategory::Trader),
    ("8zFZHuSRuDpuAR7J6FzwyF3vKNx4CVW3DFHJerQhc7Zd", "traderpow", WalletCategory::Trader),
    ("As7HjL7dzzvbRbaD3WCun47robib2kmAKRXMvjHkSMB5", "otta.sol", WalletCategory::Trader),
    ("sAdNbe1cKNMDqDsa4npB3TfL62T14uAo2MsUQfLvzLT", "pr6spr.sol", WalletCategory::Trader),
    ("DdvhMhDJsobQdCWuWunG2QNos2S3XrYGosRkkVWhjLeW", "放手一搏.sol", WalletCategory::Trader),
    ("ApRnQN2HkbCn7W2WWiT2FEKvuKJp9LugRyAE1a9Hdz1", "solkcrow.sol", WalletCategory::Meme),
    ("215nhcAHjQQGgwpQSJQ7zR26etbjjtVdW74NLzwEgQjP", "binladen.sol", WalletCategory::Trader),
    ("86AEJExyjeNNgcp7GrAvCXTDicf5aGWgoERbXFiG1EdD", "bundled.sol", WalletCategory::Trader),
    ("4nvNc7dDEqKKLM4Sr9Kgk3t1of6f8G66kT64VoC95LYh", "mambone.sol", WalletCategory::Trader),
    ("8rvAsDKeAcEjEkiZMug9k8v1y8mW6gQQiMobd89Uy7qR", "communitymember🚀.sol", WalletCategory::Trader),
    ("DNfuF1L62WWyW3pNakVkyGGFzVVhj4Yr52jSmdTyeBHm", "gake", WalletCategory::Trader),
    ("CyaE1VxvBrahnPWkqm5VsdCvyS2QmNht2UFrKJHga54o", "Cented7", WalletCategory::Trader),
    ("CBaM2xaPdDdhaopd8dD93LJAvextJoPngdKFz8QFP7JD", "poo.sol", WalletCategory::Trader),
    ("G5nxEXuFMfV74DSnsrSatqCW32F34XUnBeq3PfDS7w5E", "LeBron", WalletCategory::Trader),
    ("BDTscoqjWkgnySaJqukeSBLtKzcU5a9nTxi396zoBW9x", "abglover.sol", WalletCategory::Trader),
    ("DpNVrtA3ERfKzX4F8Pi2CVykdJJjoNxyY5QgoytAwD26", "Gorilla Capital", WalletCategory::Trader),
    ("D2wBctC1K2mEtA17i8ZfdEubkiksiAH2j8F7ri3ec71V", "Dior100x", WalletCategory::Trader),
    ("D8Scu7uNmHbreAWLBf4QwjuX5EzYZB7d3VNNMetgqmXh", "Wallet-1", WalletCategory::Other),
    ("CziTTPb6A6hbsPtf5H5GLNCWNqqk4tesdj1DzWaQBoCL", "Wallet-4", WalletCategory::Other),
    ("A8vgGPT2Vg2bQEGwkVVd6J5iJaKUBLxjtraEXt55cYwV", "Wallet-5", WalletCategory::Other),
    ("GJA1HEbxGnqBhBifH9uQauzXSB53to5rhDrzmKxhSU65", "Wallet-7", WalletCategory::Other),
    ("HW2Cg9ZYRGZRzXfdgc1pgGxdYduyVvYrYkg1H2PVLo1H", "Wallet-11", WalletCategory::Other),
    ("qTB6ryTHBU1tGEVg9a1QiRJh5euRAU3bcDdWubUJ4ne", "Wallet-13", WalletCategory::Other),
    ("BC8yiFFQWFEKrEEj75zYsuK3ZDCfv6QEeMRif9oZZ9TW", "Wallet-14", WalletCategory::Other),
    ("GqWHWPXeaYH8USxfpxP38DTYbjeCKQZnBAf8DK9nyf5Y", "Wallet-20", WalletCategory::Other),
    ("EDozia8CitSkQCnpXu3ekLJCoiLvPUWWLgiRTKiES2j2", "Wallet-24", WalletCategory::Other),
    ("m7Kaas3Kd8FHLnCioSjCoSuVDReZ6FDNBVM6HTNYuF7", "Wallet-25", WalletCategory::Other),
    ("Gdaqp3ND6r3HVAWXpawkQU18EuQqwNxpaeeio8ASVAYd", "Wallet-27", WalletCategory::Other),
    ("3pZ59YENxDAcjaKa3sahZJBcgER4rGYi4v6BpPurmsGj", "Wallet-29", WalletCategory::Other),
    ("9qwZtGC9B1isBzj3gyHtM57ffiyY2jvGUt2XP28hHHmS", "W-31", WalletCategory::Other),
    ("CTRWQ3mn1VSPdZgJdA3GiLCcBo1vA24gPnZGma89mrKn", "W-32", WalletCategory::Other),
    ("EuC9bwq7AhtvgqhzFG5TtB2q8PYmgWbQ7Eei7FaC4oG3", "Wallet-34", WalletCategory::Other),
    ("4EsY8HQB4Ak65diFrSHjwWhKSGC8sKmnzyusM993gk2w", "Wallet-35", WalletCategory::Other),
    ("49FQaWoguyV4UHkpQnRbfhyrgsngSXTxE4gR2sntypS6", "Wallet-39", WalletCategory::Other),
    ("GwyG5FQRNtY1faXYWdTLbcDNZTyW5d2Z63o1UiMUDQDT", "Wallet-40", WalletCategory::Other),
    ("4cXnf2z85UiZ5cyKsPMEULq1yufAtpkatmX4j4DBZqj2", "Wallet-41", WalletCategory::Meme),
    ("4BdKaxN8G6ka4GYtQQWk4G4dZRUTX2vQH9GcXdBREFUk", "Wallet-42", WalletCategory::Other),
    ("Aw1ici3XZ2AfBUfy6apUHRQiTEJGm2Hybhqj2Jfxf2mS", "Wallet-43", WalletCategory::Other),
    ("BoYHJoKntk3pjkaV8qFojEonSPWmWMfQocZTwDd1bcGG", "Wallet-44", WalletCategory::Other),
    ("7VBTpiiEjkwRbRGHJFUz6o5fWuhPFtAmy8JGhNqwHNnn", "Wallet-45", WalletCategory::Other),
    ("GWc85m5984LrD7xT4CApdY21n9TiByL5yYkPjJStZi5v", "Wallet-71", WalletCategory::Other),
    ("7hDYFYF9PVVyEmDUdUzXFt5PCkmm9PrtpP6x9iHrLCHF", "Wallet-72", WalletCategory::Other),
    ("LGLDRembAFreaCd9uSSvURTb3phoRdbskDCxpX46seB", "Wallet-73", WalletCategory::Other),
    ("33MuTy5vo3GymDT6rhmA1trYH3ySWcgYa1HSVxD9Tko5", "Wallet-74", WalletCategory::Other),
    ("D7HRiKDNxfwV4KUMdeV4HrWCQn9uDovWZXxS7X6L6pJi", "Wallet-75", WalletCategory::Other),
    ("86ssNTYmFVux4NABe22hjjicVsgLzaNfgQzLa1ScicPg", "Wallet-76", WalletCategory::Other),
    ("3h65MmPZksoKKyEpEjnWU2Yk2iYT5oZDNitGy5cTaxoE", "Wallet-77", WalletCategory::Other),
    ("DUMP3pM27QXLgHQSNYmPwiwkSrMMXwWiR1ETNpd4uALc", "DUMP", WalletCategory::Other),
    ("DQu6RDQpMCBn4ZZLL5Wdmn2FqjTu7d2yBTaA22K3xLdv", "Wallet-80", WalletCategory::Other),
];

/// Registry entry, or an address-prefix label in the `other` category.
pub fn wallet_info(address: &str) -> WalletInfo {
    WALLET_REGISTRY
        .iter()
        .find(|(known, _, _)| *known == address)
        .map(|(_, label, category)| WalletInfo {
            label: label.to_string(),
            category: *category,
        })
        .unwrap_or_else(|| WalletInfo {
            label: format!("{}...", address.chars().take(8).collect::<String>()),
            category: WalletCategory::Other,
        })
}

pub fn wallet_label(address: &str) -> String {
    let info = wallet_info(address);
    format!("{} {}", info.category.glyph(), info.label)
}

pub fn wallets_by_category(selection: WalletSelection) -> Vec<String> {
    WALLET_REGISTRY
        .iter()
        .filter(|(_, _, category)| match selection {
            WalletSelection::All => true,
            WalletSelection::Category(wanted) => *category == wanted,
        })
        .map(|(address, _, _)| address.to_string())
        .collect()
}
