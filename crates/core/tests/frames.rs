use swann_core::{
    request::{MAX_PAYLOAD_LEN, PASSWORD_OBFUSCATION_OFFSET, PREFIX_LEN},
    Request, RequestType, Response, ResponseType,
};

fn printable_ascii() -> impl Iterator<Item = u8> {
    0x20_u8..=0x7e
}

#[test]
fn test_response_prefixes_are_exact() {
    for kind in ResponseType::KNOWN {
        let prefix = kind.prefix().unwrap();
        assert_eq!(Response::parse(prefix).kind(), kind);

        // Flipping any single byte of the prefix must break the match.
        for i in 0..PREFIX_LEN {
            let mut bytes = *prefix;
            bytes[i] ^= 0x01;
            assert_eq!(
                Response::parse(&bytes).kind(),
                ResponseType::Unknown,
                "{kind} with byte {i} changed"
            );
        }
    }
}

#[test]
fn test_prefixes_are_unique() {
    let mut prefixes = ResponseType::KNOWN
        .iter()
        .filter_map(|kind| kind.prefix())
        .chain(
            [
                RequestType::Reboot,
                RequestType::Password,
                RequestType::Ssid,
                RequestType::Mac,
            ]
            .into_iter()
            .map(RequestType::prefix),
        )
        .collect::<Vec<_>>();

    let total = prefixes.len();
    prefixes.sort_unstable();
    prefixes.dedup();
    assert_eq!(prefixes.len(), total);
    assert!(prefixes.iter().all(|prefix| prefix.is_ascii()));
}

#[test]
fn test_password_transform_for_printable_ascii() {
    let alphabet = printable_ascii().collect::<Vec<_>>();

    for len in [0, 1, 8, 63, alphabet.len(), MAX_PAYLOAD_LEN] {
        let password = alphabet.iter().copied().cycle().take(len).collect::<Vec<_>>();
        let request = Request::password(&password).unwrap();

        let bytes = request.message().as_bytes();
        assert_eq!(bytes.len(), PREFIX_LEN + 1 + len);
        assert_eq!(&bytes[..PREFIX_LEN], RequestType::Password.prefix());
        assert_eq!(usize::from(bytes[PREFIX_LEN]), len);

        for (sent, original) in bytes[PREFIX_LEN + 1..].iter().zip(&password) {
            assert_eq!(*sent, original.wrapping_add(PASSWORD_OBFUSCATION_OFFSET));
        }
    }
}

#[test]
fn test_commands_without_payload_are_nine_bytes() {
    for request in [Request::mac(), Request::reboot()] {
        let bytes = request.message().as_bytes();
        assert_eq!(bytes.len(), 9);
        assert_eq!(&bytes[..PREFIX_LEN], request.kind().prefix());
        assert_eq!(bytes[PREFIX_LEN], 0);
    }
}
