//! Curated advisory text for each disease/pest class the model can detect.
//!
//! The table is hand-authored and fixed for the life of the process; lookup
//! is total over all strings via the unknown-label fallback.

/// Title and advisory description for one detected class.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiseaseInfo {
    pub title: &'static str,
    pub description: &'static str,
}

/// The class labels the pistachio model is trained on, in model output order.
pub const CLASS_LABELS: [&str; 6] = [
    "PHYPSO",
    "FORD FO",
    "MYCOPT",
    "SOKADE",
    "FİZYOLOJİ",
    "SONID",
];

/// Fallback entry for labels the table does not know.
pub const UNKNOWN_LABEL_INFO: DiseaseInfo = DiseaseInfo {
    title: "Bilinmeyen Etiket",
    description: "Bu etiket için detaylı bilgi bulunmamaktadır.",
};

/// Look up the advisory card content for a class label.
pub fn lookup(class_label: &str) -> DiseaseInfo {
    match class_label {
        "PHYPSO" => DiseaseInfo {
            title: "Yaprak Lekesi (Phyllosticta)",
            description: "Yaprakta koyu dairesel noktalarla karakterizedir. \
                Öneri: Hızlı mantar ilacı uygulaması ve iyi hava sirkülasyonu sağlayın.",
        },
        "FORD FO" => DiseaseInfo {
            title: "Fusarium Odaklı Hastalık",
            description: "Solma ve kahverengileşme görülebilir. \
                Öneri: Hastalıklı bitki parçalarını uzaklaştırın.",
        },
        "MYCOPT" => DiseaseInfo {
            title: "Mycosphaerella Yaprak Hastalığı",
            description: "Küçük kahverengi lekeler ve erken yaprak dökümü. \
                Öneri: Koruyucu bakır içerikli ilaçlar veya uygun fungisitler kullanın.",
        },
        "SOKADE" => DiseaseInfo {
            title: "Sokan ve Delen Zararlı Hasarı",
            description: "Böceklerin emgi veya delme sonucu oluşan hasar. \
                Öneri: Zararlı türünü belirleyip uygun insektisit ile mücadele edin.",
        },
        "FİZYOLOJİ" => DiseaseInfo {
            title: "Çevresel Stres/Bozukluk",
            description: "Besin eksikliği veya ısı stresi. \
                Öneri: Toprak analizi yapın, sulama ve gübreleme programını gözden geçirin.",
        },
        "SONID" => DiseaseInfo {
            title: "Tanımlanmamış Yaprak Hastalığı",
            description: "Modelin tespit ettiği bilinmeyen hastalık. \
                Öneri: Uzman bir ziraat mühendisine başvurarak kesin teşhis koydurun.",
        },
        _ => UNKNOWN_LABEL_INFO,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_known_label_has_a_curated_entry() {
        for label in CLASS_LABELS {
            let info = lookup(label);
            assert_ne!(info, UNKNOWN_LABEL_INFO, "missing entry for {label}");
            assert!(!info.title.is_empty());
            assert!(info.description.contains("Öneri:"), "no advice for {label}");
        }
    }

    #[test]
    fn test_curated_entries_are_exact() {
        let expected = [
            (
                "PHYPSO",
                "Yaprak Lekesi (Phyllosticta)",
                "Yaprakta koyu dairesel noktalarla karakterizedir. \
                 Öneri: Hızlı mantar ilacı uygulaması ve iyi hava sirkülasyonu sağlayın.",
            ),
            (
                "FORD FO",
                "Fusarium Odaklı Hastalık",
                "Solma ve kahverengileşme görülebilir. \
                 Öneri: Hastalıklı bitki parçalarını uzaklaştırın.",
            ),
            (
                "MYCOPT",
                "Mycosphaerella Yaprak Hastalığı",
                "Küçük kahverengi lekeler ve erken yaprak dökümü. \
                 Öneri: Koruyucu bakır içerikli ilaçlar veya uygun fungisitler kullanın.",
            ),
            (
                "SOKADE",
                "Sokan ve Delen Zararlı Hasarı",
                "Böceklerin emgi veya delme sonucu oluşan hasar. \
                 Öneri: Zararlı türünü belirleyip uygun insektisit ile mücadele edin.",
            ),
            (
                "FİZYOLOJİ",
                "Çevresel Stres/Bozukluk",
                "Besin eksikliği veya ısı stresi. \
                 Öneri: Toprak analizi yapın, sulama ve gübreleme programını gözden geçirin.",
            ),
            (
                "SONID",
                "Tanımlanmamış Yaprak Hastalığı",
                "Modelin tespit ettiği bilinmeyen hastalık. \
                 Öneri: Uzman bir ziraat mühendisine başvurarak kesin teşhis koydurun.",
            ),
        ];

        for (label, title, description) in expected {
            let info = lookup(label);
            assert_eq!(info.title, title, "wrong title for {label}");
            assert_eq!(info.description, description, "wrong description for {label}");
        }
    }

    #[test]
    fn test_unknown_labels_get_the_fixed_fallback() {
        assert_eq!(lookup("NOT-A-LABEL"), UNKNOWN_LABEL_INFO);
        assert_eq!(lookup(""), UNKNOWN_LABEL_INFO);
        // Lookup is case-sensitive, matching the model's label table.
        assert_eq!(lookup("phypso"), UNKNOWN_LABEL_INFO);
    }
}
