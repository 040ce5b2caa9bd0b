//! Built-in batik motif dictionary and classifier class mapping.

use batik_core::CatalogEntry;

const SAMPLE_IMAGE_BASE: &str =
    "https://batik-types-forecast.s3.ap-southeast-2.amazonaws.com/samples";
const SHOP_SEARCH_BASE: &str = "https://www.tokopedia.com/search?st=&q=";

struct Motif {
    key: &'static str,
    name: &'static str,
    province: &'static str,
    description: &'static str,
    occasion: &'static str,
    shop_query: &'static str,
}

/// Catalog keys in classifier output order: ordinate `i` is `CLASS_KEYS[i]`.
pub const CLASS_KEYS: [&str; 10] = [
    "aceh_pintu_aceh",
    "bali_barong",
    "banten_surosowan",
    "bengkulu_besurek",
    "yogya_parang",
    "solo_kawung",
    "cirebon_mega_mendung",
    "jakarta_ondel_ondel",
    "jambi_bungo_tanjung",
    "jawa_barat_cirebonan",
];

const MOTIFS: &[Motif] = &[
    Motif {
        key: "aceh_pintu_aceh",
        name: "Batik Pintu Aceh",
        province: "Aceh",
        description: "Batik Aceh dengan motif 'Pintu Aceh' terinspirasi dari desain pintu rumah tradisional Aceh yang sangat khas. Motif ini menggambarkan keindahan arsitektur Aceh dengan ornamen yang detail dan bermakna filosofis.",
        occasion: "Batik ini sangat cocok dikenakan dalam acara formal, pernikahan adat, dan acara budaya Aceh.",
        shop_query: "batik aceh pintu aceh",
    },
    Motif {
        key: "bali_barong",
        name: "Batik Barong Bali",
        province: "Bali",
        description: "Batik dengan motif Barong yang merupakan figur mitologi Bali sebagai simbol kebaikan. Motif ini menggambarkan sosok Barong dengan detail ornamen khas Bali yang indah dan sakral.",
        occasion: "Cocok untuk upacara keagamaan Hindu, festival budaya Bali, dan acara formal di Bali.",
        shop_query: "batik bali barong",
    },
    Motif {
        key: "banten_surosowan",
        name: "Batik Surosowan Banten",
        province: "Banten",
        description: "Batik khas Banten dengan motif Surosowan yang terinspirasi dari Keraton Surosowan, bekas pusat pemerintahan Kesultanan Banten. Motif ini menggambarkan kemegahan arsitektur keraton dengan filosofi kepemimpinan.",
        occasion: "Ideal untuk acara kenegaraan, upacara adat Banten, dan event formal budaya.",
        shop_query: "batik banten surosowan",
    },
    Motif {
        key: "bengkulu_besurek",
        name: "Batik Besurek Bengkulu",
        province: "Bengkulu",
        description: "Batik Bengkulu dengan motif kaligrafi Arab (Besurek) yang memadukan unsur Islamic dengan budaya lokal Bengkulu. Motif ini unik karena menggabungkan tulisan Arab dengan ornamen tradisional.",
        occasion: "Cocok untuk acara keagamaan Islam, festival budaya, dan acara formal di Bengkulu.",
        shop_query: "batik bengkulu besurek",
    },
    Motif {
        key: "yogya_parang",
        name: "Batik Parang Yogyakarta",
        province: "Yogyakarta",
        description: "Batik klasik Yogyakarta dengan motif Parang yang melambangkan gelombang laut atau ombak. Motif ini memiliki makna filosofis tentang kekuatan dan ketabahan dalam menghadapi tantangan hidup.",
        occasion: "Sangat cocok untuk acara resmi keraton, pernikahan Jawa, upacara adat, dan acara formal.",
        shop_query: "batik yogya parang",
    },
    Motif {
        key: "solo_kawung",
        name: "Batik Kawung Solo",
        province: "Jawa Tengah",
        description: "Batik Solo dengan motif Kawung yang terinspirasi dari buah kolang-kaling (kawung). Motif geometris ini melambangkan kesucian, kebijaksanaan, dan keadilan dalam kehidupan.",
        occasion: "Ideal untuk acara formal, upacara keraton Solo, pernikahan tradisional Jawa, dan acara budaya.",
        shop_query: "batik solo kawung",
    },
    Motif {
        key: "cirebon_mega_mendung",
        name: "Batik Mega Mendung Cirebon",
        province: "Jawa Barat",
        description: "Batik Cirebon dengan motif Mega Mendung yang menggambarkan awan mendung dengan gradasi warna yang indah. Motif ini melambangkan kesabaran dan ketenangan hati dalam menghadapi cobaan.",
        occasion: "Cocok untuk acara formal, festival batik, pernikahan, dan acara budaya Cirebon.",
        shop_query: "batik cirebon mega mendung",
    },
    Motif {
        key: "jakarta_ondel_ondel",
        name: "Batik Ondel-ondel Jakarta",
        province: "DKI Jakarta",
        description: "Batik modern Jakarta dengan motif Ondel-ondel, boneka raksasa khas Betawi yang menjadi ikon budaya Jakarta. Motif ini menggambarkan keceriaan dan semangat masyarakat Betawi.",
        occasion: "Sempurna untuk festival Betawi, acara budaya Jakarta, dan event modern dengan nuansa tradisional.",
        shop_query: "batik jakarta ondel ondel",
    },
    Motif {
        key: "jambi_bungo_tanjung",
        name: "Batik Bungo Tanjung Jambi",
        province: "Jambi",
        description: "Batik Jambi dengan motif Bungo Tanjung yang terinspirasi dari bunga tanjung, bunga khas Jambi. Motif ini menggambarkan keharuman dan keindahan alam Jambi dengan filosofi kesucian hati.",
        occasion: "Cocok untuk acara pernikahan Melayu, festival budaya Jambi, dan acara formal daerah.",
        shop_query: "batik jambi bungo tanjung",
    },
    Motif {
        key: "jawa_barat_cirebonan",
        name: "Batik Cirebonan Jawa Barat",
        province: "Jawa Barat",
        description: "Batik khas Jawa Barat dengan pengaruh Cirebon yang menggabungkan motif tradisional Jawa dengan sentuhan budaya Tionghoa dan Islam. Motifnya kaya akan ornamen dan warna cerah.",
        occasion: "Ideal untuk acara multikultural, pernikahan campuran, dan festival seni budaya Jawa Barat.",
        shop_query: "batik jawa barat cirebonan",
    },
];

/// The built-in catalog in its canonical order.
pub fn builtin_entries() -> Vec<CatalogEntry> {
    MOTIFS
        .iter()
        .map(|m| CatalogEntry {
            key: m.key.to_string(),
            name: m.name.to_string(),
            province: m.province.to_string(),
            description: m.description.to_string(),
            occasion: m.occasion.to_string(),
            shop_link: format!("{}{}", SHOP_SEARCH_BASE, m.shop_query.replace(' ', "%20")),
            image_link: format!("{}/{}.jpg", SAMPLE_IMAGE_BASE, m.key),
        })
        .collect()
}

/// The built-in class mapping as owned keys.
pub fn builtin_class_keys() -> Vec<String> {
    CLASS_KEYS.iter().map(|k| k.to_string()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_class_key_has_entry() {
        let entries = builtin_entries();
        for key in CLASS_KEYS {
            assert_eq!(entries.iter().filter(|e| e.key == key).count(), 1, "{}", key);
        }
        assert_eq!(entries.len(), CLASS_KEYS.len());
    }

    #[test]
    fn test_links_are_derived() {
        let entries = builtin_entries();
        let barong = entries.iter().find(|e| e.key == "bali_barong").unwrap();
        assert_eq!(
            barong.shop_link,
            "https://www.tokopedia.com/search?st=&q=batik%20bali%20barong"
        );
        assert_eq!(
            barong.image_link,
            "https://batik-types-forecast.s3.ap-southeast-2.amazonaws.com/samples/bali_barong.jpg"
        );
    }
}
